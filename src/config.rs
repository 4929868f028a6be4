use crate::error::{Result, SkyError};
use crate::surface::Rgb;
use crate::terrain::TerrainParams;

pub const DEFAULT_BACKGROUND: Rgb = (0x05, 0x00, 0x4c);
pub const DEFAULT_STAR_COLOR: Rgb = (0xff, 0xff, 0xff);
pub const DEFAULT_TERRAIN_COLOR: Rgb = (0x00, 0x00, 0x00);

#[derive(Clone, Debug)]
pub struct SkyConfig {
    pub background: Rgb,
    pub star_color: Rgb,
    pub terrain_color: Rgb,
    pub terrain: TerrainParams,
    pub shooting_stars: usize,
    pub fps: u32,
    // None draws a fresh seed per session
    pub seed: Option<u64>,
    // Logical pixels per terminal column and per half-block row
    pub pixels_per_cell: usize,
}

impl Default for SkyConfig {
    fn default() -> Self {
        Self {
            background: DEFAULT_BACKGROUND,
            star_color: DEFAULT_STAR_COLOR,
            terrain_color: DEFAULT_TERRAIN_COLOR,
            terrain: TerrainParams::default(),
            shooting_stars: 2,
            fps: 60,
            seed: None,
            pixels_per_cell: 8,
        }
    }
}

impl SkyConfig {
    pub fn validate(&self) -> Result<()> {
        if self.fps == 0 {
            return Err(SkyError::InvalidConfig("fps must be at least 1".into()));
        }
        if self.pixels_per_cell == 0 {
            return Err(SkyError::InvalidConfig("pixels per cell must be at least 1".into()));
        }
        let TerrainParams {
            initial_displacement,
            roughness,
        } = self.terrain;
        if !initial_displacement.is_finite() || initial_displacement < 0.0 {
            return Err(SkyError::InvalidConfig(format!(
                "displacement must be a non-negative number, got {initial_displacement}"
            )));
        }
        if !(roughness > 0.0 && roughness <= 1.0) {
            return Err(SkyError::InvalidConfig(format!(
                "roughness must be in (0, 1], got {roughness}"
            )));
        }
        Ok(())
    }
}

pub fn parse_hex_color(hex: &str) -> Result<Rgb> {
    let digits = hex.trim_start_matches('#');
    if digits.len() != 6 || !digits.is_ascii() {
        return Err(SkyError::InvalidColor(hex.to_string()));
    }

    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16).map_err(|_| SkyError::InvalidColor(hex.to_string()))
    };

    Ok((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_with_and_without_hash() {
        assert_eq!(parse_hex_color("05004c").unwrap(), DEFAULT_BACKGROUND);
        assert_eq!(parse_hex_color("#FFFFFF").unwrap(), (255, 255, 255));
        assert_eq!(parse_hex_color("1a1b26").unwrap(), (0x1a, 0x1b, 0x26));
    }

    #[test]
    fn rejects_malformed_hex() {
        for bad in ["", "fff", "12345g", "#1234567", "ééé"] {
            assert!(
                matches!(parse_hex_color(bad), Err(SkyError::InvalidColor(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn defaults_validate() {
        let config = SkyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.shooting_stars, 2);
        assert_eq!(config.terrain.initial_displacement, 140.0);
        assert_eq!(config.terrain.roughness, 0.6);
    }

    #[test]
    fn bad_values_fail_validation() {
        let mut config = SkyConfig::default();
        config.fps = 0;
        assert!(config.validate().is_err());

        let mut config = SkyConfig::default();
        config.terrain.roughness = 1.5;
        assert!(config.validate().is_err());

        let mut config = SkyConfig::default();
        config.terrain.initial_displacement = f32::NAN;
        assert!(config.validate().is_err());
    }
}
