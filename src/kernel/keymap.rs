//! 全局撤销/重做快捷键
//!
//! 与编辑焦点无关：任何位置按下的组合键都作用于当前活动文件。

use crate::kernel::services::ports::KeybindingRule;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Chord {
    pub key: String,
    pub modifiers: Modifiers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryCommand {
    Undo,
    Redo,
}

impl HistoryCommand {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "undo" | "history.undo" => Some(HistoryCommand::Undo),
            "redo" | "history.redo" => Some(HistoryCommand::Redo),
            _ => None,
        }
    }
}

/// 解析 `ctrl+shift+z` 形式的组合键；单个大写字母隐含 shift
pub fn parse_chord(value: &str) -> Option<Chord> {
    let mut modifiers = Modifiers::default();
    let mut key_part: Option<&str> = None;
    for part in value.split('+').map(str::trim).filter(|p| !p.is_empty()) {
        match part.to_ascii_lowercase().as_str() {
            "ctrl" | "control" => modifiers.ctrl = true,
            "shift" => modifiers.shift = true,
            "alt" | "option" => modifiers.alt = true,
            "super" | "meta" | "cmd" | "command" => modifiers.meta = true,
            _ => key_part = Some(part),
        }
    }

    let key_part = key_part?;
    let mut chars = key_part.chars();
    let first = chars.next()?;
    let key = if chars.next().is_none() {
        if first.is_ascii_uppercase() {
            modifiers.shift = true;
        }
        first.to_ascii_lowercase().to_string()
    } else {
        key_part.to_ascii_lowercase()
    };
    Some(Chord { key, modifiers })
}

#[derive(Debug, Clone)]
pub struct Keymap {
    bindings: FxHashMap<Chord, HistoryCommand>,
}

impl Default for Keymap {
    fn default() -> Self {
        let mut keymap = Self {
            bindings: FxHashMap::default(),
        };
        for (chord, command) in [
            ("ctrl+z", HistoryCommand::Undo),
            ("cmd+z", HistoryCommand::Undo),
            ("ctrl+y", HistoryCommand::Redo),
            ("ctrl+shift+z", HistoryCommand::Redo),
            ("cmd+shift+z", HistoryCommand::Redo),
        ] {
            keymap.bind(chord, command);
        }
        keymap
    }
}

impl Keymap {
    pub fn new() -> Self {
        Self::default()
    }

    /// 默认绑定加上配置里的规则；无法解析的规则记录后跳过
    pub fn with_rules(rules: &[KeybindingRule]) -> Self {
        let mut keymap = Self::default();
        for rule in rules {
            let Some(command) = HistoryCommand::from_name(&rule.command) else {
                tracing::warn!(key = %rule.key, command = %rule.command, "unknown keybinding command");
                continue;
            };
            if !keymap.bind(&rule.key, command) {
                tracing::warn!(key = %rule.key, "invalid keybinding");
            }
        }
        keymap
    }

    pub fn bind(&mut self, chord: &str, command: HistoryCommand) -> bool {
        match parse_chord(chord) {
            Some(chord) => {
                self.bindings.insert(chord, command);
                true
            }
            None => false,
        }
    }

    pub fn resolve(&self, chord: &str) -> Option<HistoryCommand> {
        let chord = parse_chord(chord)?;
        self.bindings.get(&chord).copied()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/keymap.rs"]
mod tests;
