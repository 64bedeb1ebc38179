//! Number formats used by heading numbering levels

use std::fmt;
use thiserror::Error;

/// Latin capital letters, in alphabet order
const LATIN: [char; 26] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S',
    'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
];

/// Cyrillic capital letters of the Russian alphabet, Ё included (А=1 .. Я=33)
const CYRILLIC: [char; 33] = [
    'А', 'Б', 'В', 'Г', 'Д', 'Е', 'Ё', 'Ж', 'З', 'И', 'Й', 'К', 'Л', 'М', 'Н', 'О', 'П', 'Р', 'С',
    'Т', 'У', 'Ф', 'Х', 'Ц', 'Ч', 'Ш', 'Щ', 'Ъ', 'Ы', 'Ь', 'Э', 'Ю', 'Я',
];

/// Largest value rendered as a Roman numeral
const MAX_ROMAN: u32 = 3999;

/// Alphabet used by letter formats and letter-based heading numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alphabet {
    Latin,
    Cyrillic,
}

impl Alphabet {
    fn letters(self) -> &'static [char] {
        match self {
            Alphabet::Latin => &LATIN,
            Alphabet::Cyrillic => &CYRILLIC,
        }
    }

    /// Letter for a 1-based value, wrapping modulo the alphabet length
    ///
    /// Value 27 in Latin renders as `A` again. Zero has no letter and
    /// renders as the last letter, mirroring the modulo arithmetic.
    pub fn letter(self, value: u32) -> char {
        let letters = self.letters();
        let len = letters.len() as u64;
        let index = (u64::from(value) + len - 1) % len;
        letters[index as usize]
    }

    /// 1-based position of a letter in this alphabet (case-insensitive)
    pub fn position(self, letter: char) -> Option<u32> {
        let upper = letter.to_uppercase().next()?;
        self.letters()
            .iter()
            .position(|&c| c == upper)
            .map(|i| i as u32 + 1)
    }

    /// 1-based position of a letter in whichever supported alphabet contains it
    pub fn ordinal_of(letter: char) -> Option<u32> {
        Alphabet::Cyrillic
            .position(letter)
            .or_else(|| Alphabet::Latin.position(letter))
    }
}

/// Error for a number-format keyword that is not a heading number format
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatParseError {
    /// The keyword denotes a bullet or an unnumbered level
    #[error("format '{0}' does not produce a number")]
    NotNumbered(String),

    /// The keyword is not recognized at all
    #[error("unsupported number format '{0}'")]
    Unsupported(String),
}

/// Closed set of supported number formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberFormat {
    Decimal,
    UpperRoman,
    LowerRoman,
    UpperLetter(Alphabet),
    LowerLetter(Alphabet),
}

impl NumberFormat {
    /// Parse a WordprocessingML `numFmt` keyword
    ///
    /// # Returns
    /// * `Ok(NumberFormat)` - A numbering format
    /// * `Err(FormatParseError::NotNumbered)` - `bullet` or `none`
    /// * `Err(FormatParseError::Unsupported)` - Any other keyword
    pub fn parse(keyword: &str) -> Result<Self, FormatParseError> {
        match keyword.trim() {
            "decimal" | "decimalZero" | "cardinalText" | "ordinalText" => Ok(NumberFormat::Decimal),
            "upperRoman" => Ok(NumberFormat::UpperRoman),
            "lowerRoman" => Ok(NumberFormat::LowerRoman),
            "upperLetter" => Ok(NumberFormat::UpperLetter(Alphabet::Latin)),
            "lowerLetter" => Ok(NumberFormat::LowerLetter(Alphabet::Latin)),
            "russianUpper" => Ok(NumberFormat::UpperLetter(Alphabet::Cyrillic)),
            "russianLower" => Ok(NumberFormat::LowerLetter(Alphabet::Cyrillic)),
            "bullet" | "none" => Err(FormatParseError::NotNumbered(keyword.to_string())),
            other => Err(FormatParseError::Unsupported(other.to_string())),
        }
    }

    /// Render a counter value in this format
    pub fn render(self, value: u32) -> String {
        match self {
            NumberFormat::Decimal => value.to_string(),
            NumberFormat::UpperRoman => to_roman(value),
            NumberFormat::LowerRoman => to_roman(value).to_lowercase(),
            NumberFormat::UpperLetter(alphabet) => alphabet.letter(value).to_string(),
            NumberFormat::LowerLetter(alphabet) => alphabet.letter(value).to_lowercase().collect(),
        }
    }
}

impl fmt::Display for NumberFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NumberFormat::Decimal => "decimal",
            NumberFormat::UpperRoman => "upperRoman",
            NumberFormat::LowerRoman => "lowerRoman",
            NumberFormat::UpperLetter(Alphabet::Latin) => "upperLetter",
            NumberFormat::LowerLetter(Alphabet::Latin) => "lowerLetter",
            NumberFormat::UpperLetter(Alphabet::Cyrillic) => "russianUpper",
            NumberFormat::LowerLetter(Alphabet::Cyrillic) => "russianLower",
        };
        write!(f, "{}", name)
    }
}

/// Render a value as an upper-case Roman numeral
///
/// Values outside 1..=3999 are returned as decimal digits.
pub fn to_roman(value: u32) -> String {
    if value == 0 || value > MAX_ROMAN {
        return value.to_string();
    }

    const PAIRS: [(u32, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];

    let mut remaining = value;
    let mut out = String::new();
    for (amount, symbol) in PAIRS {
        while remaining >= amount {
            out.push_str(symbol);
            remaining -= amount;
        }
    }
    out
}
