//! Teletext character sets (ETS 300 706, chapter 15).
//!
//! Level 1 teletext text uses the Latin G0 primary set with one of the
//! national option sub-sets overlaid on 13 character positions. X/26
//! enhancement packets can additionally pull characters from the G2
//! supplementary set and compose Latin letters with diacritical marks.
//!
//! All tables yield precomposed (NFC) Unicode scalar values; the page buffer
//! stores them as UCS-2 code units.

use tracing::{debug, warn};

/// Latin G0 primary set, code points 0x20..0x7F.
///
/// Plain ASCII apart from 0x7F, which renders as a filled block. National
/// flavour comes from overlaying a sub-set on top of this base.
pub const G0_LATIN: [char; 96] = [
    ' ', '!', '"', '#', '$', '%', '&', '\'', '(', ')', '*', '+', ',', '-', '.', '/',
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', ':', ';', '<', '=', '>', '?',
    '@', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O',
    'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', '[', '\\', ']', '^', '_',
    '`', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o',
    'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', '{', '|', '}', '~', '■',
];

/// G2 Latin supplementary set, code points 0x20..0x7F
/// (ETS 300 706, chapter 15.6.1, table 37).
pub const G2_LATIN: [char; 96] = [
    ' ', '¡', '¢', '£', '$', '¥', '#', '§', '¤', '‘', '“', '«', '←', '↑', '→', '↓',
    '°', '±', '²', '³', '×', 'µ', '¶', '·', '÷', '’', '”', '»', '¼', '½', '¾', '¿',
    ' ', '`', '´', 'ˆ', '˜', '¯', '˘', '˙', '¨', '.', '˚', '¸', '_', '˝', '˛', 'ˇ',
    '―', '¹', '®', '©', '™', '♪', '₠', '‰', 'α', ' ', ' ', ' ', '⅛', '⅜', '⅝', '⅞',
    'Ω', 'Æ', 'Đ', 'ª', 'Ħ', ' ', 'Ĳ', 'Ŀ', 'Ł', 'Ø', 'Œ', 'º', 'Þ', 'Ŧ', 'Ŋ', 'ŉ',
    'ĸ', 'æ', 'đ', 'ð', 'ħ', 'ı', 'ĳ', 'ŀ', 'ł', 'ø', 'œ', 'ß', 'þ', 'ŧ', 'ŋ', '■',
];

/// The 13 G0 positions a national option sub-set replaces
/// (0x23, 0x24, 0x40, 0x5B..0x60, 0x7B..0x7E), as table indices.
const NATIONAL_POSITIONS: [usize; 13] = [
    0x03, 0x04, 0x20, 0x3B, 0x3C, 0x3D, 0x3E, 0x3F, 0x40, 0x5B, 0x5C, 0x5D, 0x5E,
];

/// One Latin national option sub-set (ETS 300 706, chapter 15.2, table 36).
#[derive(Debug, Clone, Copy)]
pub struct NationalSubset {
    /// Languages the sub-set serves, for diagnostics.
    pub language: &'static str,
    /// Replacement characters for [`NATIONAL_POSITIONS`], in order.
    pub characters: [char; 13],
}

/// The Latin national option sub-sets, in a fixed internal order.
pub const NATIONAL_SUBSETS: [NationalSubset; 13] = [
    NationalSubset {
        language: "English",
        characters: ['£', '$', '@', '←', '½', '→', '↑', '#', '–', '¼', '‖', '¾', '÷'],
    },
    NationalSubset {
        language: "German",
        characters: ['#', '$', '§', 'Ä', 'Ö', 'Ü', '^', '_', '°', 'ä', 'ö', 'ü', 'ß'],
    },
    NationalSubset {
        language: "Swedish, Finnish, Hungarian",
        characters: ['#', '¤', 'É', 'Ä', 'Ö', 'Å', 'Ü', '_', 'é', 'ä', 'ö', 'å', 'ü'],
    },
    NationalSubset {
        language: "Italian",
        characters: ['£', '$', 'é', '°', 'ç', '→', '↑', '#', 'ù', 'à', 'ò', 'è', 'ì'],
    },
    NationalSubset {
        language: "French",
        characters: ['é', 'ï', 'à', 'ë', 'ê', 'ù', 'î', '#', 'è', 'â', 'ô', 'û', 'ç'],
    },
    NationalSubset {
        language: "Portuguese, Spanish",
        characters: ['ç', '$', '¡', 'á', 'é', 'í', 'ó', 'ú', '¿', 'ü', 'ñ', 'è', 'à'],
    },
    NationalSubset {
        language: "Czech, Slovak",
        characters: ['#', 'ů', 'č', 'ť', 'ž', 'ý', 'í', 'ř', 'é', 'á', 'ě', 'ú', 'š'],
    },
    NationalSubset {
        language: "Polish",
        characters: ['#', 'ń', 'ą', 'Ż', 'Ś', 'Ł', 'ć', 'ó', 'ę', 'ż', 'ś', 'ł', 'ź'],
    },
    NationalSubset {
        language: "Turkish",
        characters: ['₤', 'ğ', 'İ', 'Ş', 'Ö', 'Ç', 'Ü', 'Ğ', 'ı', 'ş', 'ö', 'ç', 'ü'],
    },
    NationalSubset {
        language: "Serbian, Croatian, Slovenian",
        characters: ['#', 'Ë', 'Č', 'Ć', 'Ž', 'Đ', 'Š', 'ë', 'č', 'ć', 'ž', 'đ', 'š'],
    },
    NationalSubset {
        language: "Rumanian",
        characters: ['#', '¤', 'Ţ', 'Â', 'Ş', 'Ă', 'Î', 'ı', 'ţ', 'â', 'ş', 'ă', 'î'],
    },
    NationalSubset {
        language: "Estonian",
        characters: ['#', 'õ', 'Š', 'Ä', 'Ö', 'Ž', 'Ü', 'Õ', 'š', 'ä', 'ö', 'ž', 'ü'],
    },
    NationalSubset {
        language: "Lettish, Lithuanian",
        characters: ['#', '$', 'Š', 'ė', 'ę', 'Ž', 'č', 'ū', 'š', 'ą', 'ų', 'ž', 'į'],
    },
];

/// Maps a 7-bit default G0 character set designation to a national sub-set
/// index (ETS 300 706, chapter 15.2, tables 32 and 33).
///
/// Page-header charset bits use codes 0x00..0x07 of the same space. Codes
/// designating non-Latin G0 sets (Cyrillic, Greek, Arabic, Hebrew) have no
/// Latin sub-set and return `None`.
pub fn subset_for(designation: u8) -> Option<usize> {
    match designation & 0x7F {
        0x00 | 0x10 => Some(0),                      // English
        0x01 | 0x09 | 0x11 | 0x21 => Some(1),        // German
        0x02 | 0x0A | 0x12 => Some(2),               // Swedish, Finnish, Hungarian
        0x03 | 0x0B | 0x13 => Some(3),               // Italian
        0x04 | 0x0C | 0x14 => Some(4),               // French
        0x05 | 0x15 => Some(5),                      // Portuguese, Spanish
        0x06 | 0x0E | 0x26 => Some(6),               // Czech, Slovak
        0x08 => Some(7),                             // Polish
        0x16 | 0x36 => Some(8),                      // Turkish
        0x1D => Some(9),                             // Serbian, Croatian, Slovenian
        0x1F => Some(10),                            // Rumanian
        0x22 => Some(11),                            // Estonian
        0x23 => Some(12),                            // Lettish, Lithuanian
        _ => None,
    }
}

/// Composes a Latin base letter with the diacritical mark selected by an
/// X/26 mode 0x11..0x1F, as a precomposed code point.
///
/// `accent` is the zero-based mark index (`mode - 0x11`). Returns `None`
/// when the combination has no precomposed form; callers fall back to the
/// plain G0 character.
pub fn accented(accent: usize, letter: char) -> Option<char> {
    let composed = match accent {
        // grave
        0 => match letter {
            'A' => 'À', 'E' => 'È', 'I' => 'Ì', 'O' => 'Ò', 'U' => 'Ù',
            'a' => 'à', 'e' => 'è', 'i' => 'ì', 'o' => 'ò', 'u' => 'ù',
            _ => return None,
        },
        // acute
        1 => match letter {
            'A' => 'Á', 'C' => 'Ć', 'E' => 'É', 'I' => 'Í', 'L' => 'Ĺ',
            'N' => 'Ń', 'O' => 'Ó', 'R' => 'Ŕ', 'S' => 'Ś', 'U' => 'Ú',
            'Y' => 'Ý', 'Z' => 'Ź',
            'a' => 'á', 'c' => 'ć', 'e' => 'é', 'i' => 'í', 'l' => 'ĺ',
            'n' => 'ń', 'o' => 'ó', 'r' => 'ŕ', 's' => 'ś', 'u' => 'ú',
            'y' => 'ý', 'z' => 'ź',
            _ => return None,
        },
        // circumflex
        2 => match letter {
            'A' => 'Â', 'C' => 'Ĉ', 'E' => 'Ê', 'G' => 'Ĝ', 'H' => 'Ĥ',
            'I' => 'Î', 'J' => 'Ĵ', 'O' => 'Ô', 'S' => 'Ŝ', 'U' => 'Û',
            'W' => 'Ŵ', 'Y' => 'Ŷ',
            'a' => 'â', 'c' => 'ĉ', 'e' => 'ê', 'g' => 'ĝ', 'h' => 'ĥ',
            'i' => 'î', 'j' => 'ĵ', 'o' => 'ô', 's' => 'ŝ', 'u' => 'û',
            'w' => 'ŵ', 'y' => 'ŷ',
            _ => return None,
        },
        // tilde
        3 => match letter {
            'A' => 'Ã', 'I' => 'Ĩ', 'N' => 'Ñ', 'O' => 'Õ', 'U' => 'Ũ',
            'a' => 'ã', 'i' => 'ĩ', 'n' => 'ñ', 'o' => 'õ', 'u' => 'ũ',
            _ => return None,
        },
        // macron
        4 => match letter {
            'A' => 'Ā', 'E' => 'Ē', 'I' => 'Ī', 'O' => 'Ō', 'U' => 'Ū',
            'a' => 'ā', 'e' => 'ē', 'i' => 'ī', 'o' => 'ō', 'u' => 'ū',
            _ => return None,
        },
        // breve
        5 => match letter {
            'A' => 'Ă', 'G' => 'Ğ', 'U' => 'Ŭ',
            'a' => 'ă', 'g' => 'ğ', 'u' => 'ŭ',
            _ => return None,
        },
        // dot above
        6 => match letter {
            'C' => 'Ċ', 'E' => 'Ė', 'G' => 'Ġ', 'I' => 'İ', 'Z' => 'Ż',
            'c' => 'ċ', 'e' => 'ė', 'g' => 'ġ', 'z' => 'ż',
            _ => return None,
        },
        // diaeresis
        7 => match letter {
            'A' => 'Ä', 'E' => 'Ë', 'I' => 'Ï', 'O' => 'Ö', 'U' => 'Ü', 'Y' => 'Ÿ',
            'a' => 'ä', 'e' => 'ë', 'i' => 'ï', 'o' => 'ö', 'u' => 'ü', 'y' => 'ÿ',
            _ => return None,
        },
        // ring above
        9 => match letter {
            'A' => 'Å', 'U' => 'Ů',
            'a' => 'å', 'u' => 'ů',
            _ => return None,
        },
        // cedilla
        10 => match letter {
            'C' => 'Ç', 'G' => 'Ģ', 'K' => 'Ķ', 'L' => 'Ļ', 'N' => 'Ņ',
            'R' => 'Ŗ', 'S' => 'Ş', 'T' => 'Ţ',
            'c' => 'ç', 'g' => 'ģ', 'k' => 'ķ', 'l' => 'ļ', 'n' => 'ņ',
            'r' => 'ŗ', 's' => 'ş', 't' => 'ţ',
            _ => return None,
        },
        // double acute
        12 => match letter {
            'O' => 'Ő', 'U' => 'Ű',
            'o' => 'ő', 'u' => 'ű',
            _ => return None,
        },
        // ogonek
        13 => match letter {
            'A' => 'Ą', 'E' => 'Ę', 'I' => 'Į', 'U' => 'Ų',
            'a' => 'ą', 'e' => 'ę', 'i' => 'į', 'u' => 'ų',
            _ => return None,
        },
        // caron
        14 => match letter {
            'C' => 'Č', 'D' => 'Ď', 'E' => 'Ě', 'L' => 'Ľ', 'N' => 'Ň',
            'R' => 'Ř', 'S' => 'Š', 'T' => 'Ť', 'Z' => 'Ž',
            'c' => 'č', 'd' => 'ď', 'e' => 'ě', 'l' => 'ľ', 'n' => 'ň',
            'r' => 'ř', 's' => 'š', 't' => 'ť', 'z' => 'ž',
            _ => return None,
        },
        _ => return None,
    };
    Some(composed)
}

/// Primary G0 charset selection state.
///
/// Holds the currently active sub-set ID, the M/29 magazine default, the
/// X/28 page override and a working copy of the G0 table with the active
/// sub-set applied. The static base table is never touched.
#[derive(Debug, Clone)]
pub struct CharsetState {
    /// Active G0 sub-set designation (0..127).
    current: u8,
    /// Magazine-wide default from M/29, if any was received.
    pub g0_m29: Option<u8>,
    /// Page override from X/28, if any was received. Cleared at each new
    /// target-page header.
    pub g0_x28: Option<u8>,
    /// G0 with the active national sub-set overlaid.
    table: [char; 96],
    /// Designations already reported as unsupported (one warning per ID).
    warned: u128,
}

impl Default for CharsetState {
    fn default() -> Self {
        Self::new()
    }
}

impl CharsetState {
    /// Creates the state with the plain Latin base table active.
    pub fn new() -> Self {
        Self {
            current: 0x00,
            g0_m29: None,
            g0_x28: None,
            table: G0_LATIN,
            warned: 0,
        }
    }

    /// The active designation ID.
    pub fn current(&self) -> u8 {
        self.current
    }

    /// Translates a G0 code point (0x20..0x7F) through the active table.
    pub fn g0(&self, code: u8) -> u16 {
        debug_assert!((0x20..=0x7F).contains(&code));
        self.table[(code - 0x20) as usize] as u16
    }

    /// Switches the active national sub-set to `designation`.
    ///
    /// Unknown designations keep the current overlay; each unknown ID is
    /// reported once per stream.
    pub fn remap(&mut self, designation: u8) {
        let designation = designation & 0x7F;
        if designation == self.current {
            return;
        }
        match subset_for(designation) {
            Some(index) => {
                let subset = &NATIONAL_SUBSETS[index];
                self.table = G0_LATIN;
                for (position, &replacement) in
                    NATIONAL_POSITIONS.iter().zip(subset.characters.iter())
                {
                    self.table[*position] = replacement;
                }
                self.current = designation;
                debug!(
                    designation = format_args!("0x{designation:02X}"),
                    language = subset.language,
                    "remapped G0 national sub-set"
                );
            }
            None => {
                let bit = 1u128 << (designation & 0x7F);
                if self.warned & bit == 0 {
                    self.warned |= bit;
                    warn!(
                        designation = format_args!("0x{designation:02X}"),
                        "unsupported G0 charset designation, keeping current sub-set"
                    );
                }
            }
        }
    }
}
