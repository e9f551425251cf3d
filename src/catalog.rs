use std::fmt;

use once_cell::sync::Lazy;

pub const CORE8: [&str; 8] = [
    "Smiling face with thumbs up",
    "Sending a heart with both hands",
    "Surprised with a small sweat drop",
    "Crying with big teardrops",
    "Angry with puffed cheeks + tiny steam puffs",
    "Winking with a playful smile",
    "Laughing hard with eyes closed",
    "Sad face with droopy eyes",
];

pub const EXT8: [&str; 8] = [
    "Neutral face with tiny dot eyes (expressionless)",
    "Sleeping with Z icon above head",
    "Cheering with a small flag",
    "Waving hand hello",
    "OK hand sign",
    "Crossed arms NO gesture",
    "Facepalm pose",
    "Sending finger heart with one hand",
];

pub const EXTRA8: [&str; 8] = [
    "Holding a coffee cup, cozy mood",
    "Gaming with a small controller",
    "Working on a tiny laptop",
    "Taking a selfie with a phone",
    "Dancing pose with a small note icon",
    "Celebrating with a party popper",
    "Walking in light rain with a tiny umbrella",
    "Giving a wrapped gift forward",
];

pub const KAKAO_EXTRA8: [&str; 8] = [
    "Blowing a kiss with a tiny heart floating",
    "Rolling on the floor laughing (ROFL style)",
    "Clapping enthusiastically with spark lines",
    "Showing a shy blushing face with hands on cheeks",
    "Showing a tired yawning expression",
    "Holding up both hands in surrender / sorry pose",
    "Cheering with pom-poms in both hands",
    "Giving a thumbs down with a disappointed face",
];

/// Quoted Hangul fragments must reach the generator byte-for-byte.
pub const KOREAN_TEXT_EMOJIS: [&str; 35] = [
    "Character smiling brightly, holding up both thumbs, with the bold Korean word '럭키' written above in comic-style font.",
    "Character lying down lazily with half-closed eyes, next to the handwritten Korean text '귀찮아'.",
    "Character making a playful peace sign gesture with cheek puffed, with the cute handwritten word '쁘이' floating beside.",
    "Character eating happily with sparkling eyes, tongue slightly out, with the text '맛있어' in bold comic font.",
    "Character crying loudly with big tears streaming down, while the big handwritten Korean text '으앙' appears above.",
    "Character sleeping with a bubble from nose and 'Z' symbols, with the large Korean text '드르렁' in cartoon font.",
    "Character smiling with sparkling aura and two hands together, with pink text '행복해' above the head.",
    "Character looking down with teardrop eyes, next to the sad text '슬퍼' written in soft blue font.",
    "Character making a strong pose with fist pump, with big bold text '짱' in comic font style.",
    "Character making a heart sign with hands, with glowing text '하트' above.",
    "Character shyly blushing and covering cheeks with hands, with tiny text '힝' floating nearby.",
    "Character throwing confetti with a party popper, with big celebratory text '축하해'.",
    "Character laughing with closed eyes and open mouth, rolling with joy, and text '웃겨' in big wavy font.",
    "Character scratching back of head in embarrassment, with small shy text '머쓱'.",
    "Character crying with glistening eyes, with handwritten bold text '눈물나'.",
    "Character trembling with clenched fists, with jagged red text '부들부들'.",
    "Character amazed, wide-eyed, sparkles around, with the exclamation '우와' above.",
    "Character angry with puffed cheeks and steam, with flame-styled text '화나'.",
    "Character smirking shyly, scratching cheek, with small text '헤헤'.",
    "Character surprised, with hand on mouth, and the text '몰랐어' popping above head.",
    "Character dramatically waving goodbye with both hands, with the big text '끄읕'.",
    "Character putting on shoes, waving hand, with text '다녀올게'.",
    "Character pointing upward energetically, with the floating word '주목'.",
    "Character bowing politely with a smile, with neat text '수고했어'.",
    "Character waving hello, with big friendly text '안녕'.",
    "Character bowing deeply with a warm smile, with formal text '고마워'.",
    "Character smiling with both hands joined politely, with text '잘부탁드립니다'.",
    "Character peeking curiously from behind a wall, with small text '기웃기웃'.",
    "Character with empty pockets turned inside out, with droopy face, and text '돈없어'.",
    "Character frowning with crossed arms, with bold disappointed text '실망'.",
    "Character sitting at a desk with a book, sweating, with text '열공'.",
    "Character typing on a laptop with coffee, with text '열일'.",
    "Character holding up a phone and taking a selfie, with camera flash and text '찰칵'.",
    "Character revealing something dramatically, with spark effects and text '짜잔'.",
    "Character holding stomach with droopy eyes, with bubble text '꼬르륵'.",
];

static EMOJI_SET_16: Lazy<Vec<&'static str>> =
    Lazy::new(|| CORE8.iter().chain(EXT8.iter()).copied().collect());

static EMOJI_SET_24: Lazy<Vec<&'static str>> = Lazy::new(|| {
    EMOJI_SET_16
        .iter()
        .chain(EXTRA8.iter())
        .copied()
        .collect()
});

static EMOJI_SET_32: Lazy<Vec<&'static str>> = Lazy::new(|| {
    EMOJI_SET_24
        .iter()
        .chain(KAKAO_EXTRA8.iter())
        .copied()
        .collect()
});

static EMOJI_SET_32_KOREAN: Lazy<Vec<&'static str>> = Lazy::new(|| {
    EMOJI_SET_32
        .iter()
        .chain(KOREAN_TEXT_EMOJIS.iter())
        .copied()
        .collect()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatalogId {
    Emoji16,
    Emoji24,
    #[default]
    Emoji32,
    KoreanText35,
    Emoji32Korean,
}

impl CatalogId {
    pub const ALL: [CatalogId; 5] = [
        CatalogId::Emoji16,
        CatalogId::Emoji24,
        CatalogId::Emoji32,
        CatalogId::KoreanText35,
        CatalogId::Emoji32Korean,
    ];

    pub fn id(self) -> &'static str {
        match self {
            CatalogId::Emoji16 => "emoji_16",
            CatalogId::Emoji24 => "emoji_24",
            CatalogId::Emoji32 => "emoji_32",
            CatalogId::KoreanText35 => "korean_text_35",
            CatalogId::Emoji32Korean => "emoji_32_korean",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CatalogId::Emoji16 => "Basic 16 (core expressions + gestures)",
            CatalogId::Emoji24 => "Standard 24 (adds everyday activities)",
            CatalogId::Emoji32 => "Full 32 (adds messenger-style reactions)",
            CatalogId::KoreanText35 => "Korean text 35 (stickers with Hangul captions)",
            CatalogId::Emoji32Korean => "Full 32 followed by the 35 Korean text stickers",
        }
    }

    pub fn entries(self) -> &'static [&'static str] {
        match self {
            CatalogId::Emoji16 => EMOJI_SET_16.as_slice(),
            CatalogId::Emoji24 => EMOJI_SET_24.as_slice(),
            CatalogId::Emoji32 => EMOJI_SET_32.as_slice(),
            CatalogId::KoreanText35 => &KOREAN_TEXT_EMOJIS,
            CatalogId::Emoji32Korean => EMOJI_SET_32_KOREAN.as_slice(),
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "emoji_16" | "16" => Some(CatalogId::Emoji16),
            "emoji_24" | "24" => Some(CatalogId::Emoji24),
            "emoji_32" | "32" => Some(CatalogId::Emoji32),
            "korean_text_35" | "korean" | "35" => Some(CatalogId::KoreanText35),
            "emoji_32_korean" | "67" => Some(CatalogId::Emoji32Korean),
            _ => None,
        }
    }
}

impl fmt::Display for CatalogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_sizes_match_their_names() {
        assert_eq!(CatalogId::Emoji16.entries().len(), 16);
        assert_eq!(CatalogId::Emoji24.entries().len(), 24);
        assert_eq!(CatalogId::Emoji32.entries().len(), 32);
        assert_eq!(CatalogId::KoreanText35.entries().len(), 35);
        assert_eq!(CatalogId::Emoji32Korean.entries().len(), 67);
    }

    #[test]
    fn combined_korean_catalog_appends_text_stickers() {
        let combined = CatalogId::Emoji32Korean.entries();
        assert_eq!(&combined[..32], CatalogId::Emoji32.entries());
        assert_eq!(&combined[32..], &KOREAN_TEXT_EMOJIS[..]);
        assert_eq!(CatalogId::parse("emoji_32_korean"), Some(CatalogId::Emoji32Korean));
    }

    #[test]
    fn larger_catalogs_extend_smaller_ones() {
        let set16 = CatalogId::Emoji16.entries();
        let set24 = CatalogId::Emoji24.entries();
        let set32 = CatalogId::Emoji32.entries();
        assert_eq!(&set24[..16], set16);
        assert_eq!(&set32[..24], set24);
        assert_eq!(&set32[24..], &KAKAO_EXTRA8[..]);
    }

    #[test]
    fn korean_catalog_is_independent() {
        let korean = CatalogId::KoreanText35.entries();
        assert!(korean
            .iter()
            .all(|entry| !CatalogId::Emoji32.entries().contains(entry)));
        assert!(korean[0].contains("'럭키'"));
    }

    #[test]
    fn parses_ids_and_sizes() {
        for catalog in CatalogId::ALL {
            assert_eq!(CatalogId::parse(catalog.id()), Some(catalog));
        }
        assert_eq!(CatalogId::parse("24"), Some(CatalogId::Emoji24));
        assert_eq!(CatalogId::parse("emoji_99"), None);
    }
}
