//! Named colour sequences offered in the palette selector.

use crate::error::{DashError, Result};
use plotters::style::RGBColor;
use serde::Serialize;

pub const DEFAULT_PALETTE: &str = "Plotly";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaletteKind {
    Qualitative,
    Sequential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Palette {
    pub name: &'static str,
    pub kind: PaletteKind,
    pub colors: &'static [&'static str],
}

use PaletteKind::{Qualitative, Sequential};

pub const PALETTES: &[Palette] = &[
    Palette {
        name: "Plotly",
        kind: Qualitative,
        colors: &[
            "#636EFA", "#EF553B", "#00CC96", "#AB63FA", "#FFA15A", "#19D3F3", "#FF6692",
            "#B6E880", "#FF97FF", "#FECB52",
        ],
    },
    Palette {
        name: "Viridis",
        kind: Sequential,
        colors: &[
            "#440154", "#482878", "#3E4989", "#31688E", "#26828E", "#1F9E89", "#35B779",
            "#6ECE58", "#B5DE2B", "#FDE725",
        ],
    },
    Palette {
        name: "Cividis",
        kind: Sequential,
        colors: &[
            "#00224E", "#123570", "#3B496C", "#575D6D", "#707173", "#8A8678", "#A59C74",
            "#C3B369", "#E1CC55", "#FEE838",
        ],
    },
    Palette {
        name: "Inferno",
        kind: Sequential,
        colors: &[
            "#000004", "#1B0C41", "#4A0C6B", "#781C6D", "#A52C60", "#CF4446", "#ED6925",
            "#FB9B06", "#F7D13D", "#FCFFA4",
        ],
    },
    Palette {
        name: "Magma",
        kind: Sequential,
        colors: &[
            "#000004", "#180F3D", "#440F76", "#721F81", "#9E2F7F", "#CD4071", "#F1605D",
            "#FD9668", "#FECA8D", "#FCFDBF",
        ],
    },
    Palette {
        name: "Plasma",
        kind: Sequential,
        colors: &[
            "#0D0887", "#46039F", "#7201A8", "#9C179E", "#BD3786", "#D8576B", "#ED7953",
            "#FB9F3A", "#FDCA26", "#F0F921",
        ],
    },
    Palette {
        name: "Turbo",
        kind: Sequential,
        colors: &[
            "#30123B", "#4145AB", "#4675ED", "#39A2FC", "#1BCFD4", "#24ECA6", "#61FC6C",
            "#A4FC3B", "#D1E834", "#F3C63A", "#FE9B2D", "#F36315", "#D93806", "#B11901",
            "#7A0402",
        ],
    },
    Palette {
        name: "G10",
        kind: Qualitative,
        colors: &[
            "#3366CC", "#DC3912", "#FF9900", "#109618", "#990099", "#0099C6", "#DD4477",
            "#66AA00", "#B82E2E", "#316395",
        ],
    },
    Palette {
        name: "T10",
        kind: Qualitative,
        colors: &[
            "#4C78A8", "#F58518", "#E45756", "#72B7B2", "#54A24B", "#EECA3B", "#B279A2",
            "#FF9DA6", "#9D755D", "#BAB0AC",
        ],
    },
    Palette {
        name: "Alphabet",
        kind: Qualitative,
        colors: &[
            "#AA0DFE", "#3283FE", "#85660D", "#782AB6", "#565656", "#1C8356", "#16FF32",
            "#F7E1A0", "#E2E2E2", "#1CBE4F", "#C4451C", "#DEA0FD", "#FE00FA", "#325A9B",
            "#FEAF16", "#F8A19F", "#90AD1C", "#F6222E", "#1CFFCE", "#2ED9FF", "#B10DA1",
            "#C075A6", "#FC1CBF", "#B00068", "#FBE426", "#FA0087",
        ],
    },
    Palette {
        name: "Dark24",
        kind: Qualitative,
        colors: &[
            "#2E91E5", "#E15F99", "#1CA71C", "#FB0D0D", "#DA16FF", "#222A2A", "#B68100",
            "#750D86", "#EB663B", "#511CFB", "#00A08B", "#FB00D1", "#FC0080", "#B2828D",
            "#6C7C32", "#778AAE", "#862A16", "#A777F1", "#620042", "#1616A7", "#DA60CA",
            "#6C4516", "#0D2A63", "#AF0038",
        ],
    },
    Palette {
        name: "Light24",
        kind: Qualitative,
        colors: &[
            "#FD3216", "#00FE35", "#6A76FC", "#FED4C4", "#FE00CE", "#0DF9FF", "#F6F926",
            "#FF9616", "#479B55", "#EEA6FB", "#DC587D", "#D626FF", "#6E899C", "#00B5F7",
            "#B68E00", "#C9FBE5", "#FF0092", "#22FFA7", "#E3EE9E", "#86CE00", "#BC7196",
            "#7E7DCD", "#FC6955", "#E48F72",
        ],
    },
    Palette {
        name: "Set1",
        kind: Qualitative,
        colors: &[
            "#E41A1C", "#377EB8", "#4DAF4A", "#984EA3", "#FF7F00", "#FFFF33", "#A65628",
            "#F781BF", "#999999",
        ],
    },
    Palette {
        name: "Pastel1",
        kind: Qualitative,
        colors: &[
            "#FBB4AE", "#B3CDE3", "#CCEBC5", "#DECBE4", "#FED9A6", "#FFFFCC", "#E5D8BD",
            "#FDDAEC", "#F2F2F2",
        ],
    },
    Palette {
        name: "Set2",
        kind: Qualitative,
        colors: &[
            "#66C2A5", "#FC8D62", "#8DA0CB", "#E78AC3", "#A6D854", "#FFD92F", "#E5C494",
            "#B3B3B3",
        ],
    },
    Palette {
        name: "Pastel2",
        kind: Qualitative,
        colors: &[
            "#B3E2CD", "#FDCDAC", "#CBD5E8", "#F4CAE4", "#E6F5C9", "#FFF2AE", "#F1E2CC",
            "#CCCCCC",
        ],
    },
    Palette {
        name: "Set3",
        kind: Qualitative,
        colors: &[
            "#8DD3C7", "#FFFFB3", "#BEBADA", "#FB8072", "#80B1D3", "#FDB462", "#B3DE69",
            "#FCCDE5", "#D9D9D9", "#BC80BD", "#CCEBC5", "#FFED6F",
        ],
    },
    Palette {
        name: "Antique",
        kind: Qualitative,
        colors: &[
            "#855C75", "#D9AF6B", "#AF6458", "#736F4C", "#526A83", "#625377", "#68855C",
            "#9C9C5E", "#A06177", "#8C785D", "#467378", "#7C7C7C",
        ],
    },
    Palette {
        name: "Bold",
        kind: Qualitative,
        colors: &[
            "#7F3C8D", "#11A579", "#3969AC", "#F2B701", "#E73F74", "#80BA5A", "#E68310",
            "#008695", "#CF1C90", "#F97B72", "#4B4B8F", "#A5AA99",
        ],
    },
    Palette {
        name: "D3",
        kind: Qualitative,
        colors: &[
            "#1F77B4", "#FF7F0E", "#2CA02C", "#D62728", "#9467BD", "#8C564B", "#E377C2",
            "#7F7F7F", "#BCBD22", "#17BECF",
        ],
    },
    Palette {
        name: "Prism",
        kind: Qualitative,
        colors: &[
            "#5F4690", "#1D6996", "#38A6A5", "#0F8554", "#73AF48", "#EDAD08", "#E17C05",
            "#CC503E", "#94346E", "#6F4070", "#994E95", "#666666",
        ],
    },
    Palette {
        name: "Safe",
        kind: Qualitative,
        colors: &[
            "#88CCEE", "#CC6677", "#DDCC77", "#117733", "#332288", "#AA4499", "#44AA99",
            "#999933", "#882255", "#661100", "#6699CC", "#888888",
        ],
    },
    Palette {
        name: "Vivid",
        kind: Qualitative,
        colors: &[
            "#E58606", "#5D69B1", "#52BCA3", "#99C945", "#CC61B0", "#24796C", "#DAA51B",
            "#2F8AC4", "#764E9F", "#ED645A", "#CC3A8E", "#A5AA99",
        ],
    },
];

pub fn palette_names() -> Vec<&'static str> {
    PALETTES.iter().map(|p| p.name).collect()
}

/// Look a palette up by name, ignoring case.
pub fn palette(name: &str) -> Result<&'static Palette> {
    PALETTES
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
        .ok_or_else(|| {
            DashError::Parse(format!(
                "Unknown palette '{}'. Available palettes: {}",
                name,
                palette_names().join(", ")
            ))
        })
}

/// Parse a colour string: `#RRGGBB`, `#RGB` or a basic colour name.
pub fn parse_color(color_str: &str) -> Option<RGBColor> {
    let color_str = color_str.trim();

    if color_str.starts_with('#') {
        return parse_hex_color(color_str);
    }

    match color_str.to_lowercase().as_str() {
        "white" => Some(RGBColor(255, 255, 255)),
        "black" => Some(RGBColor(0, 0, 0)),
        "red" => Some(RGBColor(255, 0, 0)),
        "green" => Some(RGBColor(0, 128, 0)),
        "blue" => Some(RGBColor(0, 0, 255)),
        "gray" | "grey" => Some(RGBColor(128, 128, 128)),
        "lightgray" | "lightgrey" => Some(RGBColor(192, 192, 192)),
        _ => None,
    }
}

fn parse_hex_color(hex: &str) -> Option<RGBColor> {
    let hex = hex.trim_start_matches('#');
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(RGBColor(r, g, b))
        }
        3 => {
            let r = u8::from_str_radix(&hex[0..1], 16).ok()? * 17;
            let g = u8::from_str_radix(&hex[1..2], 16).ok()? * 17;
            let b = u8::from_str_radix(&hex[2..3], 16).ok()? * 17;
            Some(RGBColor(r, g, b))
        }
        _ => None,
    }
}
