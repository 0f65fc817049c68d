/// The fixed collage layouts a booth can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum LayoutVariant {
    /// 1080x1920 phone wallpaper, square cells in a 2x2 grid.
    Mobile,
    /// 800x1200 print, 2x2 grid.
    Classic,
    /// 600x800 small print, 2x2 grid.
    Compact,
    /// 328x478 strip, four cells stacked.
    Strip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrangement {
    Grid2x2,
    VerticalStack,
}

impl Arrangement {
    /// (columns, rows)
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            Arrangement::Grid2x2 => (2, 2),
            Arrangement::VerticalStack => (1, 4),
        }
    }
}

/// How a photo is scaled into its cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitPolicy {
    /// Whole photo visible, letterboxed on the spare axis.
    Contain,
    /// Cell fully covered, overflow cropped evenly on both sides.
    Cover,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellShape {
    Square,
    /// Cells take all space the arrangement leaves them.
    Fill,
}

/// Which cuts get person segmentation before their overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundRemoval {
    AllCuts,
    FirstCutOnly,
    Disabled,
}

impl BackgroundRemoval {
    pub fn applies_to(self, cut: usize) -> bool {
        match self {
            BackgroundRemoval::AllCuts => true,
            BackgroundRemoval::FirstCutOnly => cut == 0,
            BackgroundRemoval::Disabled => false,
        }
    }
}

/// Pixel sizes of the collage's text. A zero size skips that line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextSizes {
    pub title: f32,
    pub subtitle: f32,
    pub footer: f32,
    pub tagline: f32,
    pub badge: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decorations {
    /// Translucent white line running through the middle of the frame.
    pub inner_stroke: bool,
    /// Edge of the corner hearts; 0 draws none.
    pub heart_size: u32,
    /// Gap between each heart and its canvas corner.
    pub heart_inset: u32,
    /// Upper bound of random sparkles scattered over the frame border.
    pub sparkles: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutSpec {
    pub width: u32,
    pub height: u32,
    pub frame_thickness: u32,
    pub spacing: u32,
    /// Height reserved above the cells for title and subtitle.
    pub title_space: u32,
    /// Height reserved below the cells for the date stamp and tagline.
    pub footer_space: u32,
    pub arrangement: Arrangement,
    pub cell_shape: CellShape,
    pub fit: FitPolicy,
    pub background_removal: BackgroundRemoval,
    pub badge_radius: u32,
    pub text: TextSizes,
    pub decorations: Decorations,
}

impl LayoutVariant {
    pub const ALL: [LayoutVariant; 4] = [
        LayoutVariant::Mobile,
        LayoutVariant::Classic,
        LayoutVariant::Compact,
        LayoutVariant::Strip,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LayoutVariant::Mobile => "mobile",
            LayoutVariant::Classic => "classic",
            LayoutVariant::Compact => "compact",
            LayoutVariant::Strip => "strip",
        }
    }

    pub fn spec(self) -> LayoutSpec {
        match self {
            // Cover: square cells crop the 4:3 camera frames.
            LayoutVariant::Mobile => LayoutSpec {
                width: 1080,
                height: 1920,
                frame_thickness: 16,
                spacing: 8,
                title_space: 88,
                footer_space: 64,
                arrangement: Arrangement::Grid2x2,
                cell_shape: CellShape::Square,
                fit: FitPolicy::Cover,
                background_removal: BackgroundRemoval::AllCuts,
                badge_radius: 16,
                text: TextSizes {
                    title: 36.0,
                    subtitle: 24.0,
                    footer: 20.0,
                    tagline: 16.0,
                    badge: 18.0,
                },
                decorations: Decorations {
                    inner_stroke: true,
                    heart_size: 16,
                    heart_inset: 6,
                    sparkles: 24,
                },
            },
            // Contain: whole photo visible, letterboxed top and bottom.
            LayoutVariant::Classic => LayoutSpec {
                width: 800,
                height: 1200,
                frame_thickness: 24,
                spacing: 12,
                title_space: 88,
                footer_space: 64,
                arrangement: Arrangement::Grid2x2,
                cell_shape: CellShape::Fill,
                fit: FitPolicy::Contain,
                background_removal: BackgroundRemoval::FirstCutOnly,
                badge_radius: 16,
                text: TextSizes {
                    title: 36.0,
                    subtitle: 24.0,
                    footer: 20.0,
                    tagline: 16.0,
                    badge: 18.0,
                },
                decorations: Decorations {
                    inner_stroke: true,
                    heart_size: 20,
                    heart_inset: 8,
                    sparkles: 16,
                },
            },
            // Contain
            LayoutVariant::Compact => LayoutSpec {
                width: 600,
                height: 800,
                frame_thickness: 12,
                spacing: 8,
                title_space: 64,
                footer_space: 48,
                arrangement: Arrangement::Grid2x2,
                cell_shape: CellShape::Fill,
                fit: FitPolicy::Contain,
                background_removal: BackgroundRemoval::Disabled,
                badge_radius: 12,
                text: TextSizes {
                    title: 28.0,
                    subtitle: 18.0,
                    footer: 16.0,
                    tagline: 13.0,
                    badge: 14.0,
                },
                decorations: Decorations {
                    inner_stroke: true,
                    heart_size: 12,
                    heart_inset: 4,
                    sparkles: 12,
                },
            },
            // Cover: wide cells crop the top and bottom of each frame.
            LayoutVariant::Strip => LayoutSpec {
                width: 328,
                height: 478,
                frame_thickness: 8,
                spacing: 6,
                title_space: 0,
                footer_space: 28,
                arrangement: Arrangement::VerticalStack,
                cell_shape: CellShape::Fill,
                fit: FitPolicy::Cover,
                background_removal: BackgroundRemoval::Disabled,
                badge_radius: 8,
                text: TextSizes {
                    title: 0.0,
                    subtitle: 0.0,
                    footer: 12.0,
                    tagline: 0.0,
                    badge: 10.0,
                },
                decorations: Decorations {
                    inner_stroke: false,
                    heart_size: 8,
                    heart_inset: 2,
                    sparkles: 0,
                },
            },
        }
    }
}

impl std::fmt::Display for LayoutVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
