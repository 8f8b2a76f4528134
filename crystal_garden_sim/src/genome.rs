// Genome identifier and trait decoding.
//
// A genome is a 48-bit identifier written as 12 hex digits. Decoding maps
// each byte positionally onto a heritable trait and derives three display
// colors. Decoding is a pure function of the bytes: two calls with the same
// genome always yield bit-identical traits and colors, because species
// identity is tracked by genome equality.
//
// Degenerate-genome policy: parsing never fails. The optional `0x` prefix
// is stripped, the first 12 hex digits are read, and any missing or
// unparsable digit pair decodes as 0. A garbage string therefore produces a
// visually degenerate all-zero organism rather than an error — the garden
// must keep running on bad input.
//
// See also: `types.rs` for `Rgb`, `organism.rs` which snapshots the decoded
// genotype at germination, `engine.rs` for random genome generation during
// spontaneous seeding.

use crate::types::Rgb;
use crystal_garden_prng::GardenRng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Base hue for stem coloring (a green), shifted per genome by the
/// variance byte. Flower hue is independent and spans the full spectrum.
const STEM_BASE_HUE: f32 = 110.0;

// ---------------------------------------------------------------------------
// Genome identifier
// ---------------------------------------------------------------------------

/// A 48-bit genome, stored big-endian relative to its hex spelling:
/// byte 0 is hex digits 0–1, byte 5 is hex digits 10–11.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Genome([u8; 6]);

impl Genome {
    pub const fn from_bytes(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    /// Parse a genome from hex. Never fails — see the degenerate-genome
    /// policy in the module header. Longer identifiers decode by their
    /// first 12 digits.
    pub fn from_hex(s: &str) -> Self {
        let stripped = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let digits: Vec<char> = stripped.chars().take(12).collect();
        let mut bytes = [0u8; 6];
        for (i, byte) in bytes.iter_mut().enumerate() {
            if let Some(pair) = digits.get(i * 2..i * 2 + 2) {
                let pair: String = pair.iter().collect();
                *byte = u8::from_str_radix(&pair, 16).unwrap_or(0);
            }
        }
        Self(bytes)
    }

    /// Draw a fresh random genome. Used by spontaneous seeding.
    pub fn random(rng: &mut GardenRng) -> Self {
        let mut bytes = [0u8; 6];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    /// The last 3 hex digits as a 12-bit value, 0..=4095. Feeds the vigor
    /// multiplier.
    fn vigor_bits(&self) -> u16 {
        (u16::from(self.0[4] & 0x0F) << 8) | u16::from(self.0[5])
    }
}

impl fmt::Display for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Decoded genotype
// ---------------------------------------------------------------------------

/// The decoded trait set. Immutable once decoded; organisms snapshot it at
/// germination.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Genotype {
    /// Branch attempt probability, in `[0.2, 0.5]`.
    pub branch_bias: f32,
    /// Strength of the pull toward the sun during tropism, in `[0.3, 1.0]`.
    pub sun_sensitivity: f32,
    /// Multiplier on the configured base height limit, in `[0.4, 1.8]`.
    pub max_height_factor: f32,
    /// Per-growth-step leaf emission probability, in `[0.15, 0.4]`.
    pub leaf_density: f32,
    /// Leaf cluster size factor, in `2..=5`.
    pub leaf_size: u8,
    /// Energy accrual multiplier, in `[0.5, 1.5]`.
    pub vigor: f32,
    pub stem_color: Rgb,
    pub leaf_color: Rgb,
    pub flower_color: Rgb,
}

impl Genotype {
    /// Decode a genome into its trait set. Pure: identical genomes decode
    /// to identical genotypes, colors included.
    pub fn decode(genome: Genome) -> Self {
        let b = genome.as_bytes();
        let unit = |v: u8| f32::from(v) / 255.0;

        let hue_byte = b[4];
        let variance = unit(b[5]);

        // Stem: fixed base green, nudged per genome. Leaf: a further hue
        // shift with raised lightness. Flower: full-spectrum, independent
        // of the stem hue.
        let stem_hue = STEM_BASE_HUE + (variance - 0.5) * 24.0;
        let stem_color = hsl_to_rgb(stem_hue, 0.45, 0.34);
        let leaf_color = hsl_to_rgb(stem_hue + 14.0, 0.50, 0.42 + variance * 0.08);
        let flower_color = hsl_to_rgb(
            unit(hue_byte) * 360.0,
            0.55 + variance * 0.45,
            0.55 - variance * 0.15,
        );

        Self {
            branch_bias: 0.2 + unit(b[0]) * 0.3,
            sun_sensitivity: 0.3 + unit(b[1]) * 0.7,
            max_height_factor: 0.4 + unit(b[1]) * 1.4,
            leaf_density: 0.15 + unit(b[2]) * 0.25,
            // v/64 maps 0..=255 onto exactly {0,1,2,3}, keeping the trait
            // inside its documented 2..=5 range at v = 255.
            leaf_size: 2 + b[3] / 64,
            vigor: 0.5 + f32::from(genome.vigor_bits()) / 4095.0,
            stem_color,
            leaf_color,
            flower_color,
        }
    }
}

/// HSL → RGB, hue in degrees (wrapped into [0, 360)), saturation and
/// lightness in [0, 1].
fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> Rgb {
    let h = hue.rem_euclid(360.0);
    let c = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let x = c * (1.0 - ((h / 60.0).rem_euclid(2.0) - 1.0).abs());
    let m = lightness - c / 2.0;

    let (r, g, b) = match h {
        h if h < 60.0 => (c, x, 0.0),
        h if h < 120.0 => (x, c, 0.0),
        h if h < 180.0 => (0.0, c, x),
        h if h < 240.0 => (0.0, x, c),
        h if h < 300.0 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    let channel = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgb::new(channel(r), channel(g), channel(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoding_is_deterministic() {
        let genome = Genome::from_hex("0x0A1B2C3D4E5F");
        let a = Genotype::decode(genome);
        let b = Genotype::decode(genome);
        assert_eq!(a, b);
        assert_eq!(a.stem_color, b.stem_color);
        assert_eq!(a.leaf_color, b.leaf_color);
        assert_eq!(a.flower_color, b.flower_color);
    }

    #[test]
    fn long_identifier_uses_first_twelve_digits() {
        // 18-digit identifier — decodes by its leading 12 digits.
        let genome = Genome::from_hex("0xFFFFFF000000000000");
        assert_eq!(genome, Genome::from_hex("FFFFFF000000"));

        let traits = Genotype::decode(genome);
        assert!((traits.branch_bias - 0.5).abs() < 1e-6);
        assert!((traits.sun_sensitivity - 1.0).abs() < 1e-6);
        assert!((traits.max_height_factor - 1.8).abs() < 1e-6);
        assert!((traits.vigor - 0.5).abs() < 1e-6);
    }

    #[test]
    fn garbage_degrades_to_zero_genome() {
        let genome = Genome::from_hex("not hex at all");
        assert_eq!(genome, Genome::from_bytes([0; 6]));

        // All traits sit at their range floors.
        let traits = Genotype::decode(genome);
        assert!((traits.branch_bias - 0.2).abs() < 1e-6);
        assert!((traits.sun_sensitivity - 0.3).abs() < 1e-6);
        assert!((traits.max_height_factor - 0.4).abs() < 1e-6);
        assert!((traits.leaf_density - 0.15).abs() < 1e-6);
        assert_eq!(traits.leaf_size, 2);
        assert!((traits.vigor - 0.5).abs() < 1e-6);
    }

    #[test]
    fn partially_malformed_pairs_decode_as_zero() {
        // "zz" pairs degrade to 0; valid pairs still decode.
        let genome = Genome::from_hex("ffzz00zz11zz");
        assert_eq!(genome.as_bytes(), &[0xff, 0, 0, 0, 0x11, 0]);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Genome::from_hex("0a1B2c3D4e5F"), Genome::from_hex("0A1b2C3d4E5f"));
    }

    #[test]
    fn short_identifier_pads_with_zero() {
        let genome = Genome::from_hex("ff");
        assert_eq!(genome.as_bytes(), &[0xff, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn display_roundtrip() {
        let genome = Genome::from_bytes([0x0a, 0x1b, 0x2c, 0x3d, 0x4e, 0x5f]);
        assert_eq!(genome.to_string(), "0a1b2c3d4e5f");
        assert_eq!(Genome::from_hex(&genome.to_string()), genome);
    }

    #[test]
    fn traits_stay_in_range_across_all_bytes() {
        for v in 0..=255u8 {
            let traits = Genotype::decode(Genome::from_bytes([v, v, v, v, v, v]));
            assert!((0.2..=0.5).contains(&traits.branch_bias));
            assert!((0.3..=1.0).contains(&traits.sun_sensitivity));
            assert!((0.4..=1.8).contains(&traits.max_height_factor));
            assert!((0.15..=0.4).contains(&traits.leaf_density));
            assert!((2..=5).contains(&traits.leaf_size));
            assert!((0.5..=1.5).contains(&traits.vigor));
        }
    }

    #[test]
    fn vigor_reads_the_last_three_digits() {
        // Last 3 hex digits = low nibble of byte 4 plus byte 5.
        let genome = Genome::from_hex("000000000fff");
        let traits = Genotype::decode(genome);
        assert!((traits.vigor - 1.5).abs() < 1e-6);
    }

    #[test]
    fn random_genomes_are_deterministic_per_seed() {
        let mut a = GardenRng::new(42);
        let mut b = GardenRng::new(42);
        assert_eq!(Genome::random(&mut a), Genome::random(&mut b));
    }

    #[test]
    fn hsl_primaries() {
        assert_eq!(hsl_to_rgb(0.0, 1.0, 0.5), Rgb::new(255, 0, 0));
        assert_eq!(hsl_to_rgb(120.0, 1.0, 0.5), Rgb::new(0, 255, 0));
        assert_eq!(hsl_to_rgb(240.0, 1.0, 0.5), Rgb::new(0, 0, 255));
        // Hue wraps.
        assert_eq!(hsl_to_rgb(360.0, 1.0, 0.5), hsl_to_rgb(0.0, 1.0, 0.5));
    }
}
