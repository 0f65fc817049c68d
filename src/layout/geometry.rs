use super::variant::{CellShape, FitPolicy, LayoutSpec};
use crate::{BoothError, BoothResult, CUT_COUNT};

/// Axis-aligned pixel rectangle on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

/// Where a scaled photo is drawn. With [`FitPolicy::Cover`] it can extend
/// past its cell, so the origin is signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawRect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

/// Cell positions for one canvas, in photo order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutGeometry {
    pub frame_thickness: u32,
    pub spacing: u32,
    pub cell_width: u32,
    pub cell_height: u32,
    pub cells: [Rect; CUT_COUNT],
}

impl LayoutGeometry {
    pub fn compute(spec: &LayoutSpec) -> BoothResult<Self> {
        let too_small = || BoothError::CanvasAllocation {
            width: spec.width,
            height: spec.height,
        };
        let (cols, rows) = spec.arrangement.dimensions();
        let frame = spec.frame_thickness;

        let inner_width = spec.width.checked_sub(2 * frame).ok_or_else(too_small)?;
        let inner_height = spec
            .height
            .checked_sub(2 * frame + spec.title_space + spec.footer_space)
            .ok_or_else(too_small)?;

        let mut cell_width = inner_width
            .checked_sub((cols - 1) * spec.spacing)
            .ok_or_else(too_small)?
            / cols;
        let mut cell_height = inner_height
            .checked_sub((rows - 1) * spec.spacing)
            .ok_or_else(too_small)?
            / rows;
        if spec.cell_shape == CellShape::Square {
            let side = cell_width.min(cell_height);
            cell_width = side;
            cell_height = side;
        }
        if cell_width == 0 || cell_height == 0 {
            return Err(too_small());
        }

        let grid_width = cols * cell_width + (cols - 1) * spec.spacing;
        let x0 = frame + (inner_width - grid_width) / 2;
        let y0 = frame + spec.title_space;

        let cells = std::array::from_fn(|i| {
            let (col, row) = (i as u32 % cols, i as u32 / cols);
            Rect {
                x: x0 + col * (cell_width + spec.spacing),
                y: y0 + row * (cell_height + spec.spacing),
                width: cell_width,
                height: cell_height,
            }
        });

        Ok(Self {
            frame_thickness: frame,
            spacing: spec.spacing,
            cell_width,
            cell_height,
            cells,
        })
    }

    /// Lowest pixel row covered by any cell.
    pub fn grid_bottom(&self) -> u32 {
        self.cells.iter().map(Rect::bottom).max().unwrap_or(0)
    }

    /// Cells are non-empty, disjoint and inside the frame.
    pub fn is_valid_for(&self, width: u32, height: u32) -> bool {
        let f = self.frame_thickness;
        let Some(inner) = width
            .checked_sub(2 * f)
            .zip(height.checked_sub(2 * f))
            .map(|(w, h)| Rect {
                x: f,
                y: f,
                width: w,
                height: h,
            })
        else {
            return false;
        };

        let sized = self.cells.iter().all(|c| c.width > 0 && c.height > 0);
        let inside = self.cells.iter().all(|c| inner.contains(c));
        let disjoint = self.cells.iter().enumerate().all(|(i, a)| {
            self.cells[i + 1..].iter().all(|b| !a.intersects(b))
        });
        sized && inside && disjoint
    }
}

/// Scales a `src_width` x `src_height` image into `cell`, preserving aspect
/// ratio and centring it on the axis with slack.
pub fn fit_rect(src_width: u32, src_height: u32, cell: Rect, policy: FitPolicy) -> DrawRect {
    let (sw, sh) = (u64::from(src_width.max(1)), u64::from(src_height.max(1)));
    let (cw, ch) = (u64::from(cell.width), u64::from(cell.height));

    // Source is at least as wide (relative to height) as the cell.
    let wider = sw * ch >= sh * cw;
    let match_width = match policy {
        FitPolicy::Contain => wider,
        FitPolicy::Cover => !wider,
    };

    let (width, height) = if match_width {
        (cw, ((sh * cw + sw / 2) / sw).max(1))
    } else {
        (((sw * ch + sh / 2) / sh).max(1), ch)
    };

    let x = i64::from(cell.x) + (cw as i64 - width as i64) / 2;
    let y = i64::from(cell.y) + (ch as i64 - height as i64) / 2;
    DrawRect {
        x,
        y,
        width: width as u32,
        height: height as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::variant::LayoutVariant;

    #[test]
    fn every_variant_satisfies_cell_invariants() {
        for variant in LayoutVariant::ALL {
            let spec = variant.spec();
            let geometry = LayoutGeometry::compute(&spec).unwrap();
            assert!(
                geometry.is_valid_for(spec.width, spec.height),
                "{variant}: {geometry:?}"
            );
            assert!(geometry.grid_bottom() + spec.footer_space <= spec.height - spec.frame_thickness);
        }
    }

    #[test]
    fn mobile_grid_matches_square_two_by_two() {
        let geometry = LayoutGeometry::compute(&LayoutVariant::Mobile.spec()).unwrap();
        assert_eq!((geometry.cell_width, geometry.cell_height), (520, 520));
        let origins: Vec<_> = geometry.cells.iter().map(|c| (c.x, c.y)).collect();
        assert_eq!(origins, vec![(16, 104), (544, 104), (16, 632), (544, 632)]);
    }

    #[test]
    fn strip_stacks_vertically_with_uniform_spacing() {
        let geometry = LayoutGeometry::compute(&LayoutVariant::Strip.spec()).unwrap();
        for pair in geometry.cells.windows(2) {
            assert_eq!(pair[0].x, pair[1].x);
            assert_eq!(pair[1].y - pair[0].bottom(), 6);
        }
    }

    #[test]
    fn canvas_too_small_is_rejected() {
        let mut spec = LayoutVariant::Compact.spec();
        spec.height = 100;
        assert!(matches!(
            LayoutGeometry::compute(&spec),
            Err(BoothError::CanvasAllocation { .. })
        ));
    }

    #[test]
    fn overlap_is_detected() {
        let mut geometry = LayoutGeometry::compute(&LayoutVariant::Classic.spec()).unwrap();
        geometry.cells[1] = geometry.cells[0];
        assert!(!geometry.is_valid_for(800, 1200));
    }

    fn cell() -> Rect {
        Rect {
            x: 10,
            y: 20,
            width: 200,
            height: 200,
        }
    }

    #[test]
    fn contain_wide_image_spans_cell_width() {
        // 100px wide source into a 200px cell: scaled up to exactly the cell width.
        let r = fit_rect(100, 50, cell(), FitPolicy::Contain);
        assert_eq!(r, DrawRect { x: 10, y: 70, width: 200, height: 100 });
    }

    #[test]
    fn contain_tall_image_is_horizontally_centred() {
        let r = fit_rect(30, 100, cell(), FitPolicy::Contain);
        assert_eq!((r.width, r.height), (60, 200));
        let left = r.x - 10;
        let right = 210 - (r.x + i64::from(r.width));
        assert!((left - right).abs() <= 1);
        assert_eq!(r.y, 20);
    }

    #[test]
    fn cover_crops_overflow_evenly() {
        let r = fit_rect(640, 480, cell(), FitPolicy::Cover);
        assert_eq!((r.width, r.height), (267, 200));
        assert_eq!(r.y, 20);
        assert_eq!(r.x, 10 - 33);
    }

    #[test]
    fn matching_aspect_fills_exactly_either_way() {
        let square = fit_rect(50, 50, cell(), FitPolicy::Contain);
        assert_eq!(square, fit_rect(50, 50, cell(), FitPolicy::Cover));
        assert_eq!(square, DrawRect { x: 10, y: 20, width: 200, height: 200 });
    }
}
