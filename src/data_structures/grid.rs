//! The 2D grid model decoded from a source image.
//!
//! Each pixel block of the source image encodes one grid cell:
//!
//! - red channel: tile type key (the `pixel` value of a catalog entry)
//! - green channel: rotation quadrant, `0..=3` (90 degree yaw steps)
//! - blue channel: mirror flag, `0` or `1`
//!
//! The grid is dense, every coordinate in range holds exactly one cell, and
//! it is immutable after the load phase. [`Grid::save`] re-encodes the grid
//! back into an image and is a lossless inverse of [`Grid::decode`] for every
//! valid pixel value. It exists as a diagnostic round-trip artifact, not as a
//! gameplay feature.

use std::collections::HashMap;
use std::path::Path;

use image::{Rgba, RgbaImage};

use crate::data_structures::catalog::TileTypeId;

/// Errors produced while decoding or re-encoding a grid image.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("grid image is {width}x{height} px which is not a multiple of the {stride} px tile stride")]
    Dimensions { width: u32, height: u32, stride: u32 },
    #[error("failed to read or write grid image")]
    Image(#[from] image::ImageError),
}

/// One grid position: which tile type stands there and how it is oriented.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellDescriptor {
    pub tile: TileTypeId,
    /// Yaw rotation in 90 degree steps, `0..=3`.
    pub rotation: u8,
    pub mirrored: bool,
    pub grid_x: u32,
    pub grid_z: u32,
}

/// The fixed pixel-value lookup table defined by the tile catalog's metadata.
///
/// Maps the red-channel key of a grid pixel to a tile type and back. The
/// designated empty tile always has a pixel key so that substituted cells
/// survive an encode/decode round trip.
#[derive(Clone, Debug)]
pub struct TilePalette {
    /// Edge length of one cell in source-image pixels.
    pub pixel_stride: u32,
    /// Substituted for any pixel value with no matching catalog entry.
    pub empty: TileTypeId,
    by_pixel: HashMap<u8, TileTypeId>,
    pixels: Vec<u8>,
}

impl TilePalette {
    /// Build the palette from per-tile pixel keys, in tile-id order.
    ///
    /// The empty tile is allowed to omit its key in the metadata; an unused
    /// one is assigned here so encoding stays total.
    pub fn new(keys: Vec<Option<u8>>, empty: TileTypeId, pixel_stride: u32) -> Self {
        let mut by_pixel = HashMap::new();
        for (id, key) in keys.iter().enumerate() {
            if let Some(key) = key {
                let prev = by_pixel.insert(*key, TileTypeId(id));
                if let Some(TileTypeId(prev)) = prev {
                    log::warn!(
                        "pixel key {key} is declared by both tile type {prev} and {id}, keeping {id}"
                    );
                }
            }
        }
        let mut pixels: Vec<u8> = Vec::with_capacity(keys.len());
        for (id, key) in keys.into_iter().enumerate() {
            let key = key.unwrap_or_else(|| {
                let free = (0..=u8::MAX)
                    .rev()
                    .find(|k| !by_pixel.contains_key(k))
                    .unwrap_or(u8::MAX);
                by_pixel.insert(free, TileTypeId(id));
                free
            });
            pixels.push(key);
        }
        Self {
            pixel_stride: pixel_stride.max(1),
            empty,
            by_pixel,
            pixels,
        }
    }

    pub fn tile_for_pixel(&self, key: u8) -> Option<TileTypeId> {
        self.by_pixel.get(&key).copied()
    }

    pub fn pixel_for_tile(&self, id: TileTypeId) -> u8 {
        self.pixels[id.0]
    }

    /// Decode one pixel into (tile, rotation, mirrored).
    ///
    /// Any channel that has no matching catalog entry demotes the whole cell
    /// to the empty tile rather than aborting the decode.
    pub fn decode_pixel(&self, pixel: Rgba<u8>) -> (TileTypeId, u8, bool) {
        let Rgba([key, rotation, mirror, _]) = pixel;
        match self.tile_for_pixel(key) {
            Some(tile) if rotation <= 3 && mirror <= 1 => (tile, rotation, mirror == 1),
            Some(_) => {
                log::warn!(
                    "pixel ({key}, {rotation}, {mirror}) has out-of-range orientation, substituting the empty tile"
                );
                (self.empty, 0, false)
            }
            None => {
                log::warn!("pixel key {key} has no catalog entry, substituting the empty tile");
                (self.empty, 0, false)
            }
        }
    }

    pub fn encode_cell(&self, cell: &CellDescriptor) -> Rgba<u8> {
        Rgba([
            self.pixel_for_tile(cell.tile),
            cell.rotation,
            cell.mirrored as u8,
            u8::MAX,
        ])
    }
}

/// A dense width x height field of cells, static after load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    width: u32,
    height: u32,
    cells: Vec<CellDescriptor>,
}

impl Grid {
    /// Decode a source image into a grid using the catalog's palette.
    ///
    /// The image dimensions must be exact multiples of the palette's pixel
    /// stride; each stride block's top-left pixel carries the cell value.
    pub fn decode(img: &RgbaImage, palette: &TilePalette) -> Result<Self, DecodeError> {
        let stride = palette.pixel_stride;
        if img.width() % stride != 0 || img.height() % stride != 0 {
            return Err(DecodeError::Dimensions {
                width: img.width(),
                height: img.height(),
                stride,
            });
        }
        let width = img.width() / stride;
        let height = img.height() / stride;
        let mut cells = Vec::with_capacity((width * height) as usize);
        for grid_z in 0..height {
            for grid_x in 0..width {
                let pixel = *img.get_pixel(grid_x * stride, grid_z * stride);
                let (tile, rotation, mirrored) = palette.decode_pixel(pixel);
                cells.push(CellDescriptor {
                    tile,
                    rotation,
                    mirrored,
                    grid_x,
                    grid_z,
                });
            }
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    pub fn load(path: impl AsRef<Path>, palette: &TilePalette) -> Result<Self, DecodeError> {
        let img = image::open(path)?.to_rgba8();
        Self::decode(&img, palette)
    }

    /// Re-encode the grid back into an image, the inverse of [`Grid::decode`].
    pub fn encode(&self, palette: &TilePalette) -> RgbaImage {
        let stride = palette.pixel_stride;
        let mut img = RgbaImage::new(self.width * stride, self.height * stride);
        for cell in &self.cells {
            let pixel = palette.encode_cell(cell);
            for dy in 0..stride {
                for dx in 0..stride {
                    img.put_pixel(cell.grid_x * stride + dx, cell.grid_z * stride + dy, pixel);
                }
            }
        }
        img
    }

    /// Write the diagnostic round-trip image to disk.
    pub fn save(&self, path: impl AsRef<Path>, palette: &TilePalette) -> Result<(), DecodeError> {
        self.encode(palette).save(path)?;
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn cells(&self) -> &[CellDescriptor] {
        &self.cells
    }
}
