use std::fs::File;
use std::io::{BufReader, BufWriter, Seek, Write};
use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::encoder::{colortype, TiffEncoder, TiffValue};
use tiff::tags::Tag;

use crate::common::{Error, Result};
use crate::image::{ImageStack, PixelBuffer, Samples};

const DISPLAY_MIN: &str = "display.min";
const DISPLAY_MAX: &str = "display.max";

pub(crate) fn read_stack(path: &Path) -> Result<ImageStack> {
    let file = BufReader::new(File::open(path)?);
    let mut decoder = Decoder::new(file)?.with_limits(Limits::unlimited());

    // Stack metadata lives in the first page's description.
    let description = decoder.get_tag_ascii_string(Tag::ImageDescription).ok();

    let mut slices = Vec::new();
    loop {
        match decoder.colortype()? {
            tiff::ColorType::Gray(_) => {}
            other => {
                return Err(Error::InvalidImage(format!(
                    "{}: page {} is {:?}, only grayscale stacks are supported",
                    path.display(),
                    slices.len(),
                    other
                )));
            }
        }

        let (width, height) = decoder.dimensions()?;
        let samples = match decoder.read_image()? {
            DecodingResult::U8(data) => Samples::U8(data),
            DecodingResult::U16(data) => Samples::U16(data),
            DecodingResult::F32(data) => Samples::F32(data),
            _ => {
                return Err(Error::InvalidImage(format!(
                    "{}: page {} has an unsupported sample format",
                    path.display(),
                    slices.len()
                )));
            }
        };
        slices.push(PixelBuffer::new(width, height, samples)?);

        if !decoder.more_images() {
            break;
        }
        decoder.next_image()?;
    }

    let title = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut stack = ImageStack::new(title, slices)?;
    if let Some(description) = description {
        apply_description(&mut stack, &description);
    }

    tracing::debug!(
        "Read {} slice(s) of {}x{} {}-bit from {}",
        stack.slices().len(),
        stack.width(),
        stack.height(),
        stack.bit_depth(),
        path.display()
    );

    Ok(stack)
}

pub(crate) fn write_stack(stack: &ImageStack, path: &Path) -> Result<()> {
    let mut encoder = TiffEncoder::new(BufWriter::new(File::create(path)?))?;
    let description = describe(stack);

    for (index, slice) in stack.slices().iter().enumerate() {
        let description = (index == 0).then_some(description.as_str());
        let (width, height) = slice.dimensions();
        match slice.samples() {
            Samples::U8(data) => write_page::<_, colortype::Gray8>(&mut encoder, width, height, data, description)?,
            Samples::U16(data) => write_page::<_, colortype::Gray16>(&mut encoder, width, height, data, description)?,
            Samples::F32(data) => {
                write_page::<_, colortype::Gray32Float>(&mut encoder, width, height, data, description)?
            }
        }
    }

    Ok(())
}

fn write_page<W, C>(
    encoder: &mut TiffEncoder<W>,
    width: u32,
    height: u32,
    data: &[C::Inner],
    description: Option<&str>,
) -> Result<()>
where
    W: Write + Seek,
    C: colortype::ColorType,
    [C::Inner]: TiffValue,
{
    let mut image = encoder.new_image::<C>(width, height)?;
    if let Some(description) = description {
        image.encoder().write_tag(Tag::ImageDescription, description)?;
    }
    image.write_data(data)?;
    Ok(())
}

/// `key=value` lines: the display range followed by the properties.
fn describe(stack: &ImageStack) -> String {
    let mut lines = Vec::new();
    if let Some((min, max)) = stack.display_range() {
        lines.push(format!("{}={}", DISPLAY_MIN, min));
        lines.push(format!("{}={}", DISPLAY_MAX, max));
    }
    for (key, value) in stack.properties() {
        lines.push(format!("{}={}", key, value.replace('\n', " ")));
    }
    lines.join("\n")
}

fn apply_description(stack: &mut ImageStack, description: &str) {
    let mut min = None;
    let mut max = None;
    for line in description.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        match key {
            DISPLAY_MIN => min = value.parse::<f64>().ok(),
            DISPLAY_MAX => max = value.parse::<f64>().ok(),
            _ => stack.set_property(key, value),
        }
    }
    if let (Some(min), Some(max)) = (min, max) {
        stack.set_display_range(Some((min, max)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_page_stack_survives_a_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cells.tif");

        let slices = (0..3u16)
            .map(|i| PixelBuffer::new_u16(5, 4, (0..20).map(|p| p * 1000 + i).collect()).unwrap())
            .collect();
        let mut stack = ImageStack::new("ignored", slices).unwrap();
        stack.set_display_range(Some((100.0, 20000.0)));
        stack.set_property("denoise.algorithm", "nonlocalmeans");

        stack.save_tiff(&path).unwrap();
        let loaded = ImageStack::read_tiff(&path).unwrap();

        assert_eq!(loaded.title(), "cells");
        assert_eq!(loaded.slices(), stack.slices());
        assert_eq!(loaded.display_range(), Some((100.0, 20000.0)));
        assert_eq!(loaded.property("denoise.algorithm"), Some("nonlocalmeans"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ImageStack::read_tiff(dir.path().join("absent.tif")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
