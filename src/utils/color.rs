//! Background color canonicalization
//!
//! Every accepted spelling of a color collapses to an uppercase `RRGGBB`
//! string. Anything unrecognized, and `transparent`, collapses to an empty
//! string. Alpha is dropped.

use regex::Regex;
use std::sync::LazyLock;

static RGB_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^rgba?\(\s*(\d{1,3})\s*[\s,]\s*(\d{1,3})\s*[\s,]\s*(\d{1,3})(?:\s*[\s,/]\s*[\d.]+%?)?\s*\)$",
    )
    .expect("rgb() pattern is valid")
});

/// Opaque white, used wherever a background is needed but none was given
pub const WHITE: [u8; 3] = [0xFF, 0xFF, 0xFF];

/// W3C named colors, sorted by name for binary search
const NAMED_COLORS: &[(&str, &str)] = &[
    ("aliceblue", "F0F8FF"),
    ("antiquewhite", "FAEBD7"),
    ("aqua", "00FFFF"),
    ("aquamarine", "7FFFD4"),
    ("azure", "F0FFFF"),
    ("beige", "F5F5DC"),
    ("bisque", "FFE4C4"),
    ("black", "000000"),
    ("blanchedalmond", "FFEBCD"),
    ("blue", "0000FF"),
    ("blueviolet", "8A2BE2"),
    ("brown", "A52A2A"),
    ("burlywood", "DEB887"),
    ("cadetblue", "5F9EA0"),
    ("chartreuse", "7FFF00"),
    ("chocolate", "D2691E"),
    ("coral", "FF7F50"),
    ("cornflowerblue", "6495ED"),
    ("cornsilk", "FFF8DC"),
    ("crimson", "DC143C"),
    ("cyan", "00FFFF"),
    ("darkblue", "00008B"),
    ("darkcyan", "008B8B"),
    ("darkgoldenrod", "B8860B"),
    ("darkgray", "A9A9A9"),
    ("darkgreen", "006400"),
    ("darkkhaki", "BDB76B"),
    ("darkmagenta", "8B008B"),
    ("darkolivegreen", "556B2F"),
    ("darkorange", "FF8C00"),
    ("darkorchid", "9932CC"),
    ("darkred", "8B0000"),
    ("darksalmon", "E9967A"),
    ("darkseagreen", "8FBC8F"),
    ("darkslateblue", "483D8B"),
    ("darkslategray", "2F4F4F"),
    ("darkturquoise", "00CED1"),
    ("darkviolet", "9400D3"),
    ("deeppink", "FF1493"),
    ("deepskyblue", "00BFFF"),
    ("dimgray", "696969"),
    ("dodgerblue", "1E90FF"),
    ("firebrick", "B22222"),
    ("floralwhite", "FFFAF0"),
    ("forestgreen", "228B22"),
    ("fuchsia", "FF00FF"),
    ("gainsboro", "DCDCDC"),
    ("ghostwhite", "F8F8FF"),
    ("gold", "FFD700"),
    ("goldenrod", "DAA520"),
    ("gray", "808080"),
    ("green", "008000"),
    ("greenyellow", "ADFF2F"),
    ("honeydew", "F0FFF0"),
    ("hotpink", "FF69B4"),
    ("indianred", "CD5C5C"),
    ("indigo", "4B0082"),
    ("ivory", "FFFFF0"),
    ("khaki", "F0E68C"),
    ("lavender", "E6E6FA"),
    ("lavenderblush", "FFF0F5"),
    ("lawngreen", "7CFC00"),
    ("lemonchiffon", "FFFACD"),
    ("lightblue", "ADD8E6"),
    ("lightcoral", "F08080"),
    ("lightcyan", "E0FFFF"),
    ("lightgoldenrodyellow", "FAFAD2"),
    ("lightgray", "D3D3D3"),
    ("lightgreen", "90EE90"),
    ("lightpink", "FFB6C1"),
    ("lightsalmon", "FFA07A"),
    ("lightseagreen", "20B2AA"),
    ("lightskyblue", "87CEFA"),
    ("lightslategray", "778899"),
    ("lightsteelblue", "B0C4DE"),
    ("lightyellow", "FFFFE0"),
    ("lime", "00FF00"),
    ("limegreen", "32CD32"),
    ("linen", "FAF0E6"),
    ("magenta", "FF00FF"),
    ("maroon", "800000"),
    ("mediumaquamarine", "66CDAA"),
    ("mediumblue", "0000CD"),
    ("mediumorchid", "BA55D3"),
    ("mediumpurple", "9370DB"),
    ("mediumseagreen", "3CB371"),
    ("mediumslateblue", "7B68EE"),
    ("mediumspringgreen", "00FA9A"),
    ("mediumturquoise", "48D1CC"),
    ("mediumvioletred", "C71585"),
    ("midnightblue", "191970"),
    ("mintcream", "F5FFFA"),
    ("mistyrose", "FFE4E1"),
    ("moccasin", "FFE4B5"),
    ("navajowhite", "FFDEAD"),
    ("navy", "000080"),
    ("oldlace", "FDF5E6"),
    ("olive", "808000"),
    ("olivedrab", "6B8E23"),
    ("orange", "FFA500"),
    ("orangered", "FF4500"),
    ("orchid", "DA70D6"),
    ("palegoldenrod", "EEE8AA"),
    ("palegreen", "98FB98"),
    ("paleturquoise", "AFEEEE"),
    ("palevioletred", "DB7093"),
    ("papayawhip", "FFEFD5"),
    ("peachpuff", "FFDAB9"),
    ("peru", "CD853F"),
    ("pink", "FFC0CB"),
    ("plum", "DDA0DD"),
    ("powderblue", "B0E0E6"),
    ("purple", "800080"),
    ("rebeccapurple", "663399"),
    ("red", "FF0000"),
    ("rosybrown", "BC8F8F"),
    ("royalblue", "4169E1"),
    ("saddlebrown", "8B4513"),
    ("salmon", "FA8072"),
    ("sandybrown", "F4A460"),
    ("seagreen", "2E8B57"),
    ("seashell", "FFF5EE"),
    ("sienna", "A0522D"),
    ("silver", "C0C0C0"),
    ("skyblue", "87CEEB"),
    ("slateblue", "6A5ACD"),
    ("slategray", "708090"),
    ("snow", "FFFAFA"),
    ("springgreen", "00FF7F"),
    ("steelblue", "4682B4"),
    ("tan", "D2B48C"),
    ("teal", "008080"),
    ("thistle", "D8BFD8"),
    ("tomato", "FF6347"),
    ("turquoise", "40E0D0"),
    ("violet", "EE82EE"),
    ("wheat", "F5DEB3"),
    ("white", "FFFFFF"),
    ("whitesmoke", "F5F5F5"),
    ("yellow", "FFFF00"),
    ("yellowgreen", "9ACD32"),
];

/// Canonicalize a free-form color expression to `RRGGBB`, or `""`
pub fn normalize_color(input: &str) -> String {
    let color = input.trim().to_ascii_lowercase();
    if color.is_empty() || color == "transparent" {
        return String::new();
    }

    if let Ok(index) = NAMED_COLORS.binary_search_by_key(&color.as_str(), |&(name, _)| name) {
        return NAMED_COLORS[index].1.to_string();
    }

    if color.starts_with("rgb") {
        return normalize_rgb_function(&color).unwrap_or_default();
    }

    normalize_hex(color.strip_prefix('#').unwrap_or(&color)).unwrap_or_default()
}

fn normalize_rgb_function(color: &str) -> Option<String> {
    let captures = RGB_FUNCTION.captures(color)?;
    let mut channels = [0u8; 3];
    for (channel, index) in channels.iter_mut().zip(1..=3) {
        *channel = captures.get(index)?.as_str().parse::<u8>().ok()?;
    }
    Some(hex::encode_upper(channels))
}

fn normalize_hex(digits: &str) -> Option<String> {
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let rgb = match digits.len() {
        // #RGB and #RGBA
        3 | 4 => digits[..3].chars().flat_map(|c| [c, c]).collect::<String>(),
        // #RRGGBB and #RRGGBBAA
        6 | 8 => digits[..6].to_string(),
        _ => return None,
    };
    Some(rgb.to_ascii_uppercase())
}

/// Decode a normalized color into RGB, falling back to opaque white
pub fn rgb_or_white(normalized: &str) -> [u8; 3] {
    let mut rgb = [0u8; 3];
    match hex::decode_to_slice(normalized, &mut rgb) {
        Ok(()) => rgb,
        Err(_) => WHITE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("red", "FF0000")]
    #[case("RED", "FF0000")]
    #[case("  Red ", "FF0000")]
    #[case("#f00", "FF0000")]
    #[case("#FF0000", "FF0000")]
    #[case("ff0000", "FF0000")]
    #[case("#f00a", "FF0000")]
    #[case("#ff000080", "FF0000")]
    #[case("rgb(255, 0, 0)", "FF0000")]
    #[case("rgba(0,255,0,0.5)", "00FF00")]
    #[case("rgb(0 0 255)", "0000FF")]
    #[case("rebeccapurple", "663399")]
    #[case("LightGoldenrodYellow", "FAFAD2")]
    fn test_recognized_colors(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_color(input), expected);
    }

    #[rstest]
    #[case("")]
    #[case("transparent")]
    #[case("not-a-color")]
    #[case("#ggg")]
    #[case("#12345")]
    #[case("rgb(256, 0, 0)")]
    #[case("rgb(1, 2)")]
    fn test_unrecognized_colors_are_empty(#[case] input: &str) {
        assert_eq!(normalize_color(input), "");
    }

    #[test]
    fn test_named_table_is_sorted() {
        assert!(NAMED_COLORS.windows(2).all(|pair| pair[0].0 < pair[1].0));
    }

    #[test]
    fn test_rgb_or_white() {
        assert_eq!(rgb_or_white("102030"), [0x10, 0x20, 0x30]);
        assert_eq!(rgb_or_white(""), WHITE);
        assert_eq!(rgb_or_white("zzzzzz"), WHITE);
    }
}
