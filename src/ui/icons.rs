//! Shared UI icons.
//!
//! Every icon has a plain-text fallback for terminals without emoji support.

use console::Emoji;

use taskflow_common::TaskType;

// Status indicators
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR]");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "[!]");
pub static SPARKLE: Emoji<'_, '_> = Emoji("✨ ", "*");

// Entities
pub static FOLDER: Emoji<'_, '_> = Emoji("📁 ", "");
pub static USER: Emoji<'_, '_> = Emoji("👤 ", "@");
pub static COMMENT: Emoji<'_, '_> = Emoji("💬 ", ">");

// Task types
pub static TYPE_TASK: Emoji<'_, '_> = Emoji("○ ", "[T]");
pub static TYPE_BUG: Emoji<'_, '_> = Emoji("🐛 ", "[B]");
pub static TYPE_STORY: Emoji<'_, '_> = Emoji("✔ ", "[S]");
pub static TYPE_EPIC: Emoji<'_, '_> = Emoji("❗ ", "[E]");

pub fn task_type(kind: TaskType) -> &'static Emoji<'static, 'static> {
    match kind {
        TaskType::Task => &TYPE_TASK,
        TaskType::Bug => &TYPE_BUG,
        TaskType::Story => &TYPE_STORY,
        TaskType::Epic => &TYPE_EPIC,
    }
}
