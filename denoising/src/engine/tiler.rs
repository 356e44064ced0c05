use crate::image::Rect;

/// One unit of work: `core` is written to the output, `outer` is `core`
/// grown by the denoiser's margin and clipped to the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ImageTile {
    pub core: Rect,
    pub outer: Rect,
}

impl ImageTile {
    /// `core` relative to `outer`.
    pub fn core_in_outer(&self) -> Rect {
        Rect::new(
            self.core.x - self.outer.x,
            self.core.y - self.outer.y,
            self.core.width,
            self.core.height,
        )
    }
}

/// Splits a `width`x`height` slice into row-major tiles of at most
/// `tile_size` pixels per edge.
pub(crate) fn tiles(width: u32, height: u32, tile_size: u32, margin: u32) -> Vec<ImageTile> {
    let tile_size = tile_size.max(1);
    let mut tiles = Vec::new();

    for y in (0..height).step_by(tile_size as usize) {
        for x in (0..width).step_by(tile_size as usize) {
            let core = Rect::new(x, y, tile_size.min(width - x), tile_size.min(height - y));
            let outer_x = x.saturating_sub(margin);
            let outer_y = y.saturating_sub(margin);
            let outer = Rect::new(
                outer_x,
                outer_y,
                (core.right() + margin).min(width) - outer_x,
                (core.bottom() + margin).min(height) - outer_y,
            );
            tiles.push(ImageTile { core, outer });
        }
    }

    tiles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_image_is_one_tile() {
        let tiles = tiles(24, 24, 512, 9);
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0].core, Rect::new(0, 0, 24, 24));
        assert_eq!(tiles[0].outer, tiles[0].core);
    }

    #[test]
    fn cores_cover_every_pixel_once() {
        let (width, height) = (23, 17);
        let tiles = tiles(width, height, 8, 3);
        assert_eq!(tiles.len(), 3 * 3);

        let mut hits = vec![0u32; (width * height) as usize];
        for tile in &tiles {
            for y in tile.core.y..tile.core.bottom() {
                for x in tile.core.x..tile.core.right() {
                    hits[(y * width + x) as usize] += 1;
                }
            }
        }
        assert!(hits.iter().all(|&h| h == 1));
    }

    #[test]
    fn margins_are_clipped_to_the_image() {
        let tiles = tiles(20, 10, 8, 3);

        let first = tiles[0];
        assert_eq!(first.outer, Rect::new(0, 0, 11, 10));
        assert_eq!(first.core_in_outer(), Rect::new(0, 0, 8, 8));

        let middle = tiles[1];
        assert_eq!(middle.core, Rect::new(8, 0, 8, 8));
        assert_eq!(middle.outer, Rect::new(5, 0, 14, 10));
        assert_eq!(middle.core_in_outer(), Rect::new(3, 0, 8, 8));

        let last = tiles[5];
        assert_eq!(last.core, Rect::new(16, 8, 4, 2));
        assert_eq!(last.outer, Rect::new(13, 5, 7, 5));
    }
}
