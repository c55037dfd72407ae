//! Deterministic plan drafting.
//!
//! Maps a free-text idea plus two labels (industry, complexity tier) onto a
//! fixed plan template. The product copy is Arabic except for the stack
//! entries; the template tables below are the single source of truth for it.

use crate::plan::types::{Complexity, Plan};

// ---------------------------------------------------------------------------
// Template tables
// ---------------------------------------------------------------------------

/// Pages included in every drafted plan, in order.
const PAGES: [&str; 5] = [
    "الصفحة الرئيسية",
    "التسجيل وتسجيل الدخول",
    "لوحة التحكم",
    "الملف الشخصي",
    "الإعدادات",
];

/// Base features included in every drafted plan, in order. The complexity
/// tier appends three more entries.
const BASE_FEATURES: [&str; 5] = [
    "منشئ نماذج سحب وإفلات",
    "توليد مكوّنات واجهة تلقائياً",
    "إنشاء مخطط قاعدة البيانات",
    "كتابة نقاط API تلقائية",
    "نشر بضغطة زر",
];

/// Technology stack recommended by every drafted plan, in order.
const STACK: [&str; 5] = [
    "Frontend: React + Tailwind",
    "Backend: FastAPI",
    "Database: MongoDB",
    "Auth: JWT + OAuth",
    "CI/CD: GitHub Actions",
];

/// Feature fragment appended for a complexity tier.
const fn tier_features(complexity: Complexity) -> [&'static str; 3] {
    match complexity {
        Complexity::Easy => ["واجهة بسيطة", "مصادقة أساسية", "صفحة واحدة أساسية"],
        Complexity::Medium => ["لوحة إدارة", "تكامل API", "نظام صلاحيات"],
        Complexity::Advanced => ["بلوغينز", "زمن-حقيقي", "قابلية توسّع"],
    }
}

// ---------------------------------------------------------------------------
// Name derivation
// ---------------------------------------------------------------------------

/// Longest allowed plan name, in characters (inputs are routinely Arabic,
/// so all length handling here is per character, never per byte).
const NAME_MAX_CHARS: usize = 40;
/// Characters kept before the ellipsis when truncating.
const NAME_KEEP_CHARS: usize = 37;
const ELLIPSIS: &str = "...";

/// Derive the plan name from the raw idea text.
///
/// Surrounding whitespace is trimmed; an empty idea falls back to
/// `"{industry} AI App"`. Titles longer than [`NAME_MAX_CHARS`] characters
/// (including the fallback, if the industry label is long enough) keep their
/// first [`NAME_KEEP_CHARS`] characters plus `"..."`.
fn derive_name(idea: &str, industry: &str) -> String {
    let trimmed = idea.trim();
    let title = if trimmed.is_empty() {
        format!("{industry} AI App")
    } else {
        trimmed.to_owned()
    };

    if title.chars().count() <= NAME_MAX_CHARS {
        return title;
    }
    let mut name: String = title.chars().take(NAME_KEEP_CHARS).collect();
    name.push_str(ELLIPSIS);
    name
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Draft a plan for the given idea.
///
/// Total and deterministic: identical inputs always yield an identical
/// [`Plan`], and no input can make this fail. Only `name` (from `idea`),
/// `pitch` (from `industry`), and the feature tail (from `complexity`) are
/// input-sensitive; `pages` and `stack` are constants.
pub fn generate(idea: &str, industry: &str, complexity: Complexity) -> Plan {
    let pitch = format!(
        "تطبيق {industry} يعتمد على الذكاء الاصطناعي لتحويل الأوامر النصية إلى واجهات، صفحات، ونقاط API كاملة، مع نشر تلقائي وتهيئة للبنية التحتية."
    );

    let features = BASE_FEATURES
        .iter()
        .copied()
        .chain(tier_features(complexity))
        .map(str::to_owned)
        .collect();

    Plan {
        name: derive_name(idea, industry),
        pitch,
        pages: PAGES.iter().map(|p| (*p).to_owned()).collect(),
        features,
        stack: STACK.iter().map(|s| (*s).to_owned()).collect(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
