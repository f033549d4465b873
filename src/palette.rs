use std::collections::BTreeMap;

use image::Rgb;
use log::debug;
use sha2::{Digest, Sha256};

use crate::annotation::AnnotationMap;

/// Reserved color for unannotated nodes (matplotlib "grey").
pub const UNANNOTATED_COLOR: Rgb<u8> = Rgb([128, 128, 128]);

/// tab20 without its grey slot, then tab20b: 39 qualitative colors
const QUALITATIVE_39: [(u8, u8, u8); 39] = [
    // tab20
    (31, 119, 180),
    (174, 199, 232),
    (255, 127, 14),
    (255, 187, 120),
    (44, 160, 44),
    (152, 223, 138),
    (214, 39, 40),
    (255, 152, 150),
    (148, 103, 189),
    (197, 176, 213),
    (140, 86, 75),
    (196, 156, 148),
    (227, 119, 194),
    (247, 182, 210),
    (199, 199, 199),
    (188, 189, 34),
    (219, 219, 141),
    (23, 190, 207),
    (158, 218, 229),
    // tab20b
    (57, 59, 121),
    (82, 84, 163),
    (107, 110, 207),
    (156, 158, 222),
    (99, 121, 57),
    (140, 162, 82),
    (181, 207, 107),
    (206, 219, 156),
    (140, 109, 49),
    (189, 158, 57),
    (231, 186, 82),
    (231, 203, 148),
    (132, 60, 57),
    (173, 73, 74),
    (214, 97, 107),
    (231, 150, 156),
    (123, 65, 115),
    (165, 81, 148),
    (206, 109, 189),
    (222, 158, 214),
];

/// How annotation values are turned into colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorScheme {
    /// Sorted labels take consecutive palette slots, cycling when the
    /// palette runs out.
    #[default]
    Palette,
    /// Color derived from the SHA-256 digest of the label, independent of
    /// which other labels are present.
    Hash,
}

/// Color for palette slot `slot`, cycling past the end.
pub fn palette_color(slot: usize) -> Rgb<u8> {
    let (r, g, b) = QUALITATIVE_39[slot % QUALITATIVE_39.len()];
    Rgb([r, g, b])
}

/// Hash a label into a bright color.
pub fn hash_color(label: &str) -> Rgb<u8> {
    let mut hasher = Sha256::new();
    hasher.update(label.as_bytes());
    let result = hasher.finalize();

    let mut r = result[24] as f32 / 255.0;
    let mut g = result[8] as f32 / 255.0;
    let mut b = result[16] as f32 / 255.0;

    // Normalize by sum
    let sum = r + g + b;
    if sum > 0.0 {
        r /= sum;
        g /= sum;
        b /= sum;
    }

    // Brighten
    let max_component = r.max(g).max(b);
    let f = if max_component > 0.0 {
        1.5f32.min(1.0 / max_component)
    } else {
        1.0
    };

    let channel = |c: f32| (255.0 * (c * f).min(1.0)).round() as u8;
    Rgb([channel(r), channel(g), channel(b)])
}

/// Immutable annotation → color table shared by every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorRegistry {
    colors: BTreeMap<String, Rgb<u8>>,
    unannotated: Rgb<u8>,
}

impl ColorRegistry {
    pub fn build(annotations: &AnnotationMap, scheme: ColorScheme) -> Self {
        let colors: BTreeMap<String, Rgb<u8>> = annotations
            .distinct_labels()
            .into_iter()
            .enumerate()
            .map(|(slot, label)| {
                let color = match scheme {
                    ColorScheme::Palette => palette_color(slot),
                    ColorScheme::Hash => hash_color(label),
                };
                (label.to_string(), color)
            })
            .collect();
        if colors.len() > QUALITATIVE_39.len() && scheme == ColorScheme::Palette {
            debug!(
                "{} annotations for {} palette colors, colors will repeat",
                colors.len(),
                QUALITATIVE_39.len()
            );
        }
        ColorRegistry {
            colors,
            unannotated: UNANNOTATED_COLOR,
        }
    }

    /// Color for an annotation. `None` and unknown labels get the
    /// unannotated color.
    pub fn color_for(&self, label: Option<&str>) -> Rgb<u8> {
        label
            .and_then(|l| self.colors.get(l))
            .copied()
            .unwrap_or(self.unannotated)
    }

    pub fn unannotated(&self) -> Rgb<u8> {
        self.unannotated
    }

    /// Entries in label order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Rgb<u8>)> + '_ {
        self.colors.iter().map(|(l, c)| (l.as_str(), *c))
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::RawAnnotations;
    use crate::graph::GraphBuilder;

    fn annotations(labels: &[Option<&str>]) -> AnnotationMap {
        let mut b = GraphBuilder::new();
        let mut raw = RawAnnotations::default();
        for (i, label) in labels.iter().enumerate() {
            let name = format!("n{i}");
            b.add_node(name.clone(), name.clone());
            if let Some(l) = label {
                raw.insert(name, *l);
            }
        }
        AnnotationMap::resolve(&b.build(), &raw)
    }

    #[test]
    fn alphabetical_slots() {
        let map = annotations(&[Some("zwf"), Some("adh"), None, Some("adh")]);
        let reg = ColorRegistry::build(&map, ColorScheme::Palette);
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.color_for(Some("adh")), palette_color(0));
        assert_eq!(reg.color_for(Some("zwf")), palette_color(1));
        assert_eq!(reg.color_for(None), UNANNOTATED_COLOR);
        assert_eq!(reg.color_for(Some("never-seen")), UNANNOTATED_COLOR);
    }

    #[test]
    fn literal_unannotated_label_gets_reserved_grey() {
        let map = annotations(&[Some(crate::annotation::UNANNOTATED), None, Some("geneX")]);
        let reg = ColorRegistry::build(&map, ColorScheme::Palette);
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.color_for(map.label(0)), UNANNOTATED_COLOR);
        assert_eq!(reg.color_for(map.label(1)), UNANNOTATED_COLOR);
        assert_eq!(reg.color_for(map.label(2)), palette_color(0));
    }

    #[test]
    fn palette_never_uses_reserved_grey() {
        assert!((0..QUALITATIVE_39.len()).all(|i| palette_color(i) != UNANNOTATED_COLOR));
    }

    #[test]
    fn palette_cycles_past_the_end() {
        let labels: Vec<String> = (0..45).map(|i| format!("g{i:02}")).collect();
        let map = annotations(&labels.iter().map(|l| Some(l.as_str())).collect::<Vec<_>>());
        let reg = ColorRegistry::build(&map, ColorScheme::Palette);
        assert_eq!(reg.len(), 45);
        assert_eq!(reg.color_for(Some("g40")), reg.color_for(Some("g01")));
    }

    #[test]
    fn hash_scheme_ignores_other_labels() {
        let a = ColorRegistry::build(&annotations(&[Some("dnaK")]), ColorScheme::Hash);
        let b = ColorRegistry::build(&annotations(&[Some("adh"), Some("dnaK")]), ColorScheme::Hash);
        assert_eq!(a.color_for(Some("dnaK")), b.color_for(Some("dnaK")));
        assert_eq!(a.color_for(Some("dnaK")), hash_color("dnaK"));
        assert_eq!(b.unannotated(), UNANNOTATED_COLOR);
    }

    #[test]
    fn rebuild_is_identical() {
        let map = annotations(&[Some("b"), Some("a"), None, Some("c")]);
        assert_eq!(
            ColorRegistry::build(&map, ColorScheme::Palette),
            ColorRegistry::build(&map, ColorScheme::Palette)
        );
    }
}
