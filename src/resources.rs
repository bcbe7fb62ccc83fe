//! Study material suggestions per subject.
//!
//! Book lists come in two levels. Subjects in the Easy tier get the
//! foundation list; Medium and Hard subjects get the practice list built
//! around question banks.

use crate::models::Difficulty;

/// Exam tag prepended to video searches.
const EXAM_TAG: &str = "TYT";

type List = &'static [&'static str];

struct Shelf {
    foundation: List,
    practice: List,
    channels: List,
}

const TURKISH_FOUNDATION: List = &[
    "3D Turkish Question Bank (Beginner)",
    "Tonguç Paragrafik",
    "Palme Turkish Topic Guide",
    "Karekök 0 Turkish",
    "Bilgiseli Turkish",
];
const TURKISH_PRACTICE: List = &[
    "Limit TYT Turkish",
    "ÜçDörtBeş TYT Paragraph Question Bank",
    "Hız ve Renk Turkish",
    "Apotemi Turkish Question Bank",
    "Benim Hocam TYT Turkish Video Workbook",
];

const MATHS_FOUNDATION: List = &[
    "Karekök 0 Mathematics",
    "Tonguç Kampüs TYT Mathematics (First Level)",
    "3D Mathematics Topic Guide",
    "Birey A Easy Mathematics Series",
    "Palme TYT Basic Mathematics",
];
const MATHS_PRACTICE: List = &[
    "ÜçDörtBeş TYT Mathematics Question Bank",
    "Limit Mathematics (Red Series)",
    "Bilgiseli TYT Mathematics",
    "Apotemi TYT Mathematics Starter Series",
    "Endemik TYT Mathematics",
];

const PHYSICS_FOUNDATION: List = &[
    "3D TYT Physics",
    "Palme Science Topic Guide Set",
    "Karekök 0 Science Series",
    "Birey A Science",
    "Kampüs Easy Science",
];
const CHEMISTRY_FOUNDATION: List = &[
    "3D TYT Chemistry",
    "Palme Science Topic Guide Set",
    "Karekök 0 Science Series",
    "Birey A Science",
    "Kampüs Easy Science",
];
const BIOLOGY_FOUNDATION: List = &[
    "3D TYT Biology",
    "Palme Science Topic Guide Set",
    "Karekök 0 Science Series",
    "Birey A Science",
    "Kampüs Easy Science",
];
const SCIENCE_PRACTICE: List = &[
    "ÜçDörtBeş TYT Science Question Bank",
    "Apotemi TYT Science Modular Set",
    "Hız ve Renk TYT Science",
    "Aydın TYT Science Question Bank",
    "Benim Hocam Video Workbook (Science Set)",
];

const SOCIAL_FOUNDATION: List = &[
    "Karekök 0 Social Sciences",
    "3D TYT Social Sciences Question Bank",
    "Tonguç TYT Social Sciences Topic Guide",
    "Palme Social Sciences",
    "Hız ve Renk TYT Social Sciences (Easy Level)",
];
const SOCIAL_PRACTICE: List = &[
    "ÜçDörtBeş TYT Social Sciences",
    "Limit TYT Social Sciences",
    "Bilgiseli Social Sciences Question Bank",
    "Endemik Social Sciences",
    "Karekök Social Sciences (Standard Level)",
];

fn shelf(subject: &str) -> Option<Shelf> {
    let shelf = match subject {
        "Turkish" => Shelf {
            foundation: TURKISH_FOUNDATION,
            practice: TURKISH_PRACTICE,
            channels: &[
                "Benim Hocam",
                "Tonguç Akademi",
                "Ders Vakti",
                "Matematik Sevdası",
                "Öğretmen Akademisi",
            ],
        },
        "Mathematics" => Shelf {
            foundation: MATHS_FOUNDATION,
            practice: MATHS_PRACTICE,
            channels: &[
                "Tonguç Akademi",
                "Matematik Sevdası",
                "Benim Hocam",
                "Ders Vakti",
                "Matematik Dünyası",
            ],
        },
        "Geometry" => Shelf {
            foundation: MATHS_FOUNDATION,
            practice: MATHS_PRACTICE,
            channels: &[
                "Tonguç Akademi",
                "Matematik Sevdası",
                "Benim Hocam",
                "Ders Vakti",
                "Geometri Dünyası",
            ],
        },
        "Physics" => Shelf {
            foundation: PHYSICS_FOUNDATION,
            practice: SCIENCE_PRACTICE,
            channels: &[
                "Benim Hocam",
                "Tonguç Akademi",
                "Ders Vakti",
                "Fizik Dünyası",
                "Fen Bilimleri Akademisi",
            ],
        },
        "Chemistry" => Shelf {
            foundation: CHEMISTRY_FOUNDATION,
            practice: SCIENCE_PRACTICE,
            channels: &[
                "Benim Hocam",
                "Tonguç Akademi",
                "Ders Vakti",
                "Kimya Dünyası",
                "Fen Bilimleri Akademisi",
            ],
        },
        "Biology" => Shelf {
            foundation: BIOLOGY_FOUNDATION,
            practice: SCIENCE_PRACTICE,
            channels: &[
                "Benim Hocam",
                "Tonguç Akademi",
                "Ders Vakti",
                "Biyoloji Dünyası",
                "Fen Bilimleri Akademisi",
            ],
        },
        "History" => Shelf {
            foundation: SOCIAL_FOUNDATION,
            practice: SOCIAL_PRACTICE,
            channels: &[
                "Benim Hocam",
                "Tonguç Akademi",
                "Ders Vakti",
                "Tarih Dünyası",
                "Sosyal Bilimler Akademisi",
            ],
        },
        "Geography" => Shelf {
            foundation: SOCIAL_FOUNDATION,
            practice: SOCIAL_PRACTICE,
            channels: &[
                "Benim Hocam",
                "Tonguç Akademi",
                "Ders Vakti",
                "Coğrafya Dünyası",
                "Sosyal Bilimler Akademisi",
            ],
        },
        "Philosophy" => Shelf {
            foundation: SOCIAL_FOUNDATION,
            practice: SOCIAL_PRACTICE,
            channels: &[
                "Benim Hocam",
                "Tonguç Akademi",
                "Ders Vakti",
                "Felsefe Dünyası",
                "Sosyal Bilimler Akademisi",
            ],
        },
        "Religious Culture" => Shelf {
            foundation: SOCIAL_FOUNDATION,
            practice: SOCIAL_PRACTICE,
            channels: &[
                "Benim Hocam",
                "Tonguç Akademi",
                "Ders Vakti",
                "Din Kültürü Akademisi",
                "Sosyal Bilimler Akademisi",
            ],
        },
        _ => return None,
    };
    Some(shelf)
}

/// Book suggestions for a subject at the given tier. Empty for subjects
/// outside the built-in catalog.
pub fn books(subject: &str, tier: Difficulty) -> &'static [&'static str] {
    match shelf(subject) {
        Some(shelf) if tier == Difficulty::Easy => shelf.foundation,
        Some(shelf) => shelf.practice,
        None => &[],
    }
}

pub fn channels(subject: &str) -> &'static [&'static str] {
    match shelf(subject) {
        Some(shelf) => shelf.channels,
        None => &[],
    }
}

/// Search phrases for lecture and worked-solution videos on one topic.
pub fn video_searches(subject: &str, topic: &str) -> Vec<String> {
    vec![
        format!("{EXAM_TAG} {subject} {topic} lecture"),
        format!("{EXAM_TAG} {subject} {topic} question walkthrough"),
        format!("{EXAM_TAG} {subject} {topic} test solutions"),
        format!("{subject} {topic} examples"),
        format!("{subject} {topic} shortcuts"),
    ]
}
