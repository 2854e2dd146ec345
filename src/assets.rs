//! # Static Image Assets
//!
//! Icons are small PNGs loaded once at startup from the asset directory:
//!
//! - `a_train.png`: the line bullet drawn next to the countdown. Required.
//! - `<condition>.png`: one per weather condition (`clear.png`, `rain.png`,
//!   ...). Optional; a condition without an icon is drawn without one.
//!
//! Text uses the 6×10 ISO-8859-1 bitmap font built into `embedded-graphics`,
//! which includes the degree sign.

use crate::error::AssetError;
use crate::Condition;
use embedded_graphics::{
    draw_target::DrawTargetExt,
    image::ImageDrawable,
    mono_font::{iso_8859_1::FONT_6X10, MonoFont},
    pixelcolor::Rgb888,
    prelude::*,
    primitives::Rectangle,
};
use log::{info, warn};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Bitmap font for every string on the board
pub const FONT: &MonoFont<'static> = &FONT_6X10;

/// File name of the transit line icon
pub const TRAIN_ICON: &str = "a_train.png";

/// Conditions an icon is expected for
pub const CONDITION_ICONS: [&str; 4] = ["clear", "clouds", "rain", "snow"];

/// An RGB image held in memory, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct Icon {
    width: u32,
    height: u32,
    pixels: Vec<Rgb888>,
}

impl Icon {
    /// Build an icon from row-major pixels. `None` if the length is wrong.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Rgb888>) -> Option<Self> {
        let expected = (width as usize).checked_mul(height as usize)?;
        (pixels.len() == expected).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    /// Single-colour block, handy as a stand-in.
    pub fn solid(width: u32, height: u32, color: Rgb888) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width as usize * height as usize],
        }
    }

    /// Decode a PNG (or any format `image` recognises) into RGB.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, AssetError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(AssetError::Missing(path.to_path_buf()));
        }

        let rgb = image::open(path)
            .map_err(|source| AssetError::Image {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgb8();

        let (width, height) = rgb.dimensions();
        let pixels = rgb
            .pixels()
            .map(|p| Rgb888::new(p[0], p[1], p[2]))
            .collect();

        Ok(Self {
            width,
            height,
            pixels,
        })
    }
}

impl OriginDimensions for Icon {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl ImageDrawable for Icon {
    type Color = Rgb888;

    fn draw<D>(&self, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        target.fill_contiguous(&self.bounding_box(), self.pixels.iter().copied())
    }

    fn draw_sub_image<D>(&self, target: &mut D, area: &Rectangle) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        self.draw(&mut target.translated(-area.top_left).clipped(&Rectangle::new(
            Point::zero(),
            area.size,
        )))
    }
}

/// Every image the renderer draws.
#[derive(Clone, Debug)]
pub struct Assets {
    train: Icon,
    conditions: HashMap<String, Icon>,
}

impl Assets {
    pub fn new(train: Icon, conditions: HashMap<String, Icon>) -> Self {
        Self { train, conditions }
    }

    /// Load the train icon and whatever condition icons `dir` holds.
    ///
    /// # Errors
    /// Fails only if the train icon is missing or undecodable. Broken or
    /// missing condition icons are logged and skipped.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self, AssetError> {
        let dir = dir.as_ref();
        let train = Icon::open(dir.join(TRAIN_ICON))?;

        let mut conditions = HashMap::new();
        for path in png_files(dir)? {
            let Some(key) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let key = key.to_lowercase();
            if path.file_name().and_then(|n| n.to_str()) == Some(TRAIN_ICON) {
                continue;
            }
            match Icon::open(&path) {
                Ok(icon) => {
                    conditions.insert(key, icon);
                }
                Err(e) => warn!("Skipping weather icon: {}", e),
            }
        }

        for key in CONDITION_ICONS {
            if !conditions.contains_key(key) {
                warn!("No weather icon for '{}' in {}", key, dir.display());
            }
        }
        info!(
            "Loaded train icon and {} weather icons from {}",
            conditions.len(),
            dir.display()
        );

        Ok(Self { train, conditions })
    }

    pub fn train_icon(&self) -> &Icon {
        &self.train
    }

    /// Icon for `condition`, if one was loaded.
    pub fn condition_icon(&self, condition: &Condition) -> Option<&Icon> {
        self.conditions.get(&condition.icon_key())
    }
}

fn png_files(dir: &Path) -> Result<Vec<PathBuf>, AssetError> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_png = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
        if is_png {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}
