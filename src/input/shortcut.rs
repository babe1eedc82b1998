use crate::editor::tools::ToolKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutKey {
    Character(char),
    Enter,
    Escape,
    Delete,
    Backspace,
}

impl ShortcutKey {
    /// Parses a DOM-style key name (`"v"`, `"Escape"`, `"Delete"`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Enter" => Some(Self::Enter),
            "Escape" | "Esc" => Some(Self::Escape),
            "Delete" => Some(Self::Delete),
            "Backspace" => Some(Self::Backspace),
            _ => {
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(Self::Character(c)),
                    _ => None,
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShortcutModifiers {
    pub ctrl: bool,
    pub shift: bool,
}

impl ShortcutModifiers {
    pub const fn new(ctrl: bool, shift: bool) -> Self {
        Self { ctrl, shift }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputContext {
    pub dialog_open: bool,
    pub text_input_active: bool,
    pub task_locked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    DialogConfirm,
    DialogCancel,
    SelectTool(ToolKind),
    ZoomIn,
    ZoomOut,
    ResetView,
    AbortDraft,
    DeleteSelection,
}

fn resolve_dialog_shortcut(key: ShortcutKey) -> Option<ShortcutAction> {
    match key {
        ShortcutKey::Enter => Some(ShortcutAction::DialogConfirm),
        ShortcutKey::Escape => Some(ShortcutAction::DialogCancel),
        _ => None,
    }
}

fn resolve_tool_shortcut(key: char) -> Option<ShortcutAction> {
    match key.to_ascii_lowercase() {
        '+' | '=' => Some(ShortcutAction::ZoomIn),
        '-' => Some(ShortcutAction::ZoomOut),
        '0' => Some(ShortcutAction::ResetView),
        c => ToolKind::ALL
            .into_iter()
            .filter(|tool| !matches!(tool, ToolKind::ZoomIn | ToolKind::ZoomOut))
            .find(|tool| tool.shortcut() == c)
            .map(ShortcutAction::SelectTool),
    }
}

fn resolve_canvas_shortcut(
    key: ShortcutKey,
    modifiers: ShortcutModifiers,
) -> Option<ShortcutAction> {
    match (key, modifiers.ctrl) {
        (ShortcutKey::Escape, _) => Some(ShortcutAction::AbortDraft),
        (ShortcutKey::Delete, false) | (ShortcutKey::Backspace, false) => {
            Some(ShortcutAction::DeleteSelection)
        }
        (ShortcutKey::Character(c), false) => resolve_tool_shortcut(c),
        _ => None,
    }
}

/// Maps a key press to a canvas action. A confirmed task ignores every key,
/// and focused text fields keep their keys to themselves.
pub fn resolve_shortcut(
    key: ShortcutKey,
    modifiers: ShortcutModifiers,
    context: InputContext,
) -> Option<ShortcutAction> {
    if context.dialog_open {
        return resolve_dialog_shortcut(key);
    }

    if context.text_input_active || context.task_locked {
        return None;
    }

    resolve_canvas_shortcut(key, modifiers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas(key: ShortcutKey) -> Option<ShortcutAction> {
        resolve_shortcut(key, ShortcutModifiers::default(), InputContext::default())
    }

    #[test]
    fn tool_letters_select_tools_case_insensitively() {
        assert_eq!(
            canvas(ShortcutKey::Character('v')),
            Some(ShortcutAction::SelectTool(ToolKind::Select))
        );
        assert_eq!(
            canvas(ShortcutKey::Character('B')),
            Some(ShortcutAction::SelectTool(ToolKind::BBox))
        );
        assert_eq!(
            canvas(ShortcutKey::Character('p')),
            Some(ShortcutAction::SelectTool(ToolKind::Polygon))
        );
        assert_eq!(
            canvas(ShortcutKey::Character('h')),
            Some(ShortcutAction::SelectTool(ToolKind::Pan))
        );
        assert_eq!(canvas(ShortcutKey::Character('x')), None);
    }

    #[test]
    fn zoom_keys_act_immediately() {
        assert_eq!(canvas(ShortcutKey::Character('+')), Some(ShortcutAction::ZoomIn));
        assert_eq!(canvas(ShortcutKey::Character('=')), Some(ShortcutAction::ZoomIn));
        assert_eq!(canvas(ShortcutKey::Character('-')), Some(ShortcutAction::ZoomOut));
        assert_eq!(canvas(ShortcutKey::Character('0')), Some(ShortcutAction::ResetView));
    }

    #[test]
    fn escape_and_delete_map_to_editing_actions() {
        assert_eq!(canvas(ShortcutKey::Escape), Some(ShortcutAction::AbortDraft));
        assert_eq!(canvas(ShortcutKey::Delete), Some(ShortcutAction::DeleteSelection));
        assert_eq!(
            canvas(ShortcutKey::Backspace),
            Some(ShortcutAction::DeleteSelection)
        );
        assert_eq!(
            resolve_shortcut(
                ShortcutKey::Character('v'),
                ShortcutModifiers::new(true, false),
                InputContext::default()
            ),
            None
        );
    }

    #[test]
    fn locked_task_and_text_focus_swallow_keys() {
        let locked = InputContext {
            task_locked: true,
            ..InputContext::default()
        };
        let typing = InputContext {
            text_input_active: true,
            ..InputContext::default()
        };
        for context in [locked, typing] {
            assert_eq!(
                resolve_shortcut(ShortcutKey::Delete, ShortcutModifiers::default(), context),
                None
            );
            assert_eq!(
                resolve_shortcut(
                    ShortcutKey::Character('b'),
                    ShortcutModifiers::default(),
                    context
                ),
                None
            );
        }
    }

    #[test]
    fn dialog_context_takes_priority() {
        let context = InputContext {
            dialog_open: true,
            text_input_active: true,
            task_locked: true,
        };
        assert_eq!(
            resolve_shortcut(ShortcutKey::Enter, ShortcutModifiers::default(), context),
            Some(ShortcutAction::DialogConfirm)
        );
        assert_eq!(
            resolve_shortcut(ShortcutKey::Escape, ShortcutModifiers::default(), context),
            Some(ShortcutAction::DialogCancel)
        );
    }

    #[test]
    fn key_names_parse_like_dom_events() {
        assert_eq!(ShortcutKey::from_name("Escape"), Some(ShortcutKey::Escape));
        assert_eq!(ShortcutKey::from_name("v"), Some(ShortcutKey::Character('v')));
        assert_eq!(ShortcutKey::from_name("Shift"), None);
    }
}
