//! Mapping of arbitrary page fonts onto the 14 standard PDF fonts.

use std::fmt;

/// Glyph style bits as reported by the page text index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct StyleFlags(pub u32);

impl StyleFlags {
    pub const SUPERSCRIPT: u32 = 1;
    pub const ITALIC: u32 = 2;
    pub const SERIF: u32 = 4;
    pub const MONOSPACE: u32 = 8;
    pub const BOLD: u32 = 16;

    pub fn contains(self, bit: u32) -> bool {
        self.0 & bit != 0
    }

    pub fn with(self, bit: u32) -> Self {
        Self(self.0 | bit)
    }
}

/// One of the 14 fonts every PDF viewer renders without embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    TimesRoman,
    TimesBold,
    TimesItalic,
    TimesBoldItalic,
    Courier,
    CourierBold,
    CourierOblique,
    CourierBoldOblique,
    Symbol,
    ZapfDingbats,
}

#[derive(Clone, Copy)]
enum Family {
    Sans,
    Serif,
    Mono,
}

impl StandardFont {
    /// Picks the closest standard font for `name` and `flags`.
    ///
    /// Family comes from name heuristics first, then from the serif and
    /// monospace bits. Bold and italic are taken from either source.
    pub fn match_font(name: &str, flags: StyleFlags) -> Self {
        let lower = name.to_lowercase();
        let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

        if lower.contains("symbol") {
            return Self::Symbol;
        }
        if has(&["zapf", "dingbat"]) {
            return Self::ZapfDingbats;
        }

        let family = if has(&["courier", "mono", "consolas", "menlo"])
            || flags.contains(StyleFlags::MONOSPACE)
        {
            Family::Mono
        } else if (has(&["times", "serif", "georgia", "garamond"]) && !lower.contains("sans"))
            || flags.contains(StyleFlags::SERIF)
        {
            Family::Serif
        } else {
            Family::Sans
        };

        let bold = has(&["bold", "black", "heavy"]) || flags.contains(StyleFlags::BOLD);
        let italic = has(&["italic", "oblique"]) || flags.contains(StyleFlags::ITALIC);

        match (family, bold, italic) {
            (Family::Sans, false, false) => Self::Helvetica,
            (Family::Sans, true, false) => Self::HelveticaBold,
            (Family::Sans, false, true) => Self::HelveticaOblique,
            (Family::Sans, true, true) => Self::HelveticaBoldOblique,
            (Family::Serif, false, false) => Self::TimesRoman,
            (Family::Serif, true, false) => Self::TimesBold,
            (Family::Serif, false, true) => Self::TimesItalic,
            (Family::Serif, true, true) => Self::TimesBoldItalic,
            (Family::Mono, false, false) => Self::Courier,
            (Family::Mono, true, false) => Self::CourierBold,
            (Family::Mono, false, true) => Self::CourierOblique,
            (Family::Mono, true, true) => Self::CourierBoldOblique,
        }
    }

    /// PostScript base font name.
    pub fn base_name(self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::HelveticaOblique => "Helvetica-Oblique",
            Self::HelveticaBoldOblique => "Helvetica-BoldOblique",
            Self::TimesRoman => "Times-Roman",
            Self::TimesBold => "Times-Bold",
            Self::TimesItalic => "Times-Italic",
            Self::TimesBoldItalic => "Times-BoldItalic",
            Self::Courier => "Courier",
            Self::CourierBold => "Courier-Bold",
            Self::CourierOblique => "Courier-Oblique",
            Self::CourierBoldOblique => "Courier-BoldOblique",
            Self::Symbol => "Symbol",
            Self::ZapfDingbats => "ZapfDingbats",
        }
    }

    /// Four-letter short code, also used in resource names.
    pub fn code(self) -> &'static str {
        match self {
            Self::Helvetica => "helv",
            Self::HelveticaBold => "hebo",
            Self::HelveticaOblique => "heit",
            Self::HelveticaBoldOblique => "hebi",
            Self::TimesRoman => "tiro",
            Self::TimesBold => "tibo",
            Self::TimesItalic => "tiit",
            Self::TimesBoldItalic => "tibi",
            Self::Courier => "cour",
            Self::CourierBold => "cobo",
            Self::CourierOblique => "coit",
            Self::CourierBoldOblique => "cobi",
            Self::Symbol => "symb",
            Self::ZapfDingbats => "zadb",
        }
    }

    /// Symbol and ZapfDingbats carry their own built-in encoding.
    pub fn uses_builtin_encoding(self) -> bool {
        matches!(self, Self::Symbol | Self::ZapfDingbats)
    }
}

impl fmt::Display for StandardFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.base_name())
    }
}
