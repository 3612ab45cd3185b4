//! Compiled-in curriculum lists.
//!
//! Names are written as they appear on transcripts; [`RuleSet::new`]
//! normalizes them, so punctuation and bracket variants here are harmless.
//!
//! [`RuleSet::new`]: crate::classify::RuleSet::new

/// Department required courses.
pub const REQUIRED: &[&str] = &[
    "微積分",
    "普通物理",
    "普通物理實驗",
    "普通化學",
    "計算機概論",
    "程式設計",
    "線性代數",
    "離散數學",
    "資料結構",
    "演算法",
    "計算機組織",
    "作業系統",
    "數位邏輯設計",
    "數位邏輯實驗",
    "電路學",
    "電子學",
    "工程數學",
    "機率與統計",
    "系統程式",
    "專題研究",
    "國文",
    "大一英文",
    "英文聽講",
    "體育",
    "服務學習",
];

/// Category I electives (software and systems track).
pub const ELECTIVE_I: &[&str] = &[
    "計算機網路",
    "資料庫系統",
    "軟體工程",
    "編譯器設計",
    "程式語言",
    "人工智慧",
    "機器學習",
    "深度學習",
    "計算機圖學",
    "數值分析",
    "自動機與形式語言",
    "計算理論",
    "資訊安全",
    "密碼學",
    "分散式系統",
    "平行程式設計",
    "網頁程式設計",
    "物件導向程式設計",
    "嵌入式系統",
    "雲端運算",
];

/// Category II electives (hardware and signals track).
pub const ELECTIVE_II: &[&str] = &[
    "訊號與系統",
    "數位訊號處理",
    "通訊原理",
    "電磁學",
    "控制系統",
    "半導體元件",
    "積體電路設計",
    "超大型積體電路設計",
    "微處理機",
    "影像處理",
    "電腦視覺",
    "無線網路",
    "類比電路",
    "計算機結構",
    "硬體描述語言",
];
