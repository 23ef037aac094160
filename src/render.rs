use crate::canvas::{Canvas, Mark};
use crate::font::{text_height, text_width};
use crate::meeting::{Availability, UserId, Weekday};
use crate::occupancy::{compute_occupancy, OccupancyGrid, Row, BUCKETS};
use crate::time::TimeRange;
use crate::window::{compute_top_windows, OptimalWindow, DEFAULT_WINDOW_COUNT};
use image::{Rgba, RgbaImage};
use log::debug;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

const ICON_GAP: i64 = 4;
const ITEM_GAP: i64 = 10;
const LABEL_MARGIN: i64 = 6;
const ELLIPSIS: &str = "...";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Could not encode heatmap as PNG: {0}")]
    Encoding(#[from] png::EncodingError),
}

/// Geometry of the heatmap, in pixels
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct Layout {
    pub cell_width: u32,
    pub cell_height: u32,
    /// Column left of the grid holding the time labels
    pub label_width: u32,
    /// Space above and below the grid; day labels sit in the top one
    pub padding: u32,
    /// Space between the grid and the side panel
    pub gutter: u32,
    pub panel_width: u32,
    pub panel_inset: u32,
    pub min_panel_height: u32,
    pub right_padding: u32,
    pub text_scale: u32,
    pub line_height: u32,
    pub entry_spacing: u32,
    pub icon_size: u32,
    pub window_count: usize,
    /// Labels longer than this are cut and end in "..."
    pub label_max_chars: usize,
    pub placeholder_size: u32,
}

impl Default for Layout {
    fn default() -> Self {
        Layout {
            cell_width: 120,
            cell_height: 20,
            label_width: 76,
            padding: 30,
            gutter: 30,
            panel_width: 440,
            panel_inset: 12,
            min_panel_height: 150,
            right_padding: 30,
            text_scale: 2,
            line_height: 20,
            entry_spacing: 10,
            icon_size: 10,
            window_count: DEFAULT_WINDOW_COUNT,
            label_max_chars: 13,
            placeholder_size: 100,
        }
    }
}

const fn rgb(hex: u32) -> Rgba<u8> {
    Rgba([(hex >> 16) as u8, (hex >> 8) as u8, hex as u8, 0xff])
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pub background: Rgba<u8>,
    pub placeholder: Rgba<u8>,
    /// White (nobody) to saturated green (everybody)
    pub buckets: [Rgba<u8>; BUCKETS],
    pub gap: Rgba<u8>,
    pub rule: Rgba<u8>,
    pub separator: Rgba<u8>,
    pub border: Rgba<u8>,
    pub text: Rgba<u8>,
    pub panel: Rgba<u8>,
    pub check: Rgba<u8>,
    pub cross: Rgba<u8>,
}

impl Default for Palette {
    fn default() -> Self {
        Palette {
            background: rgb(0x36393f),
            placeholder: rgb(0xffffff),
            buckets: [
                rgb(0xffffff),
                rgb(0xebf5e6),
                rgb(0xd6ebcc),
                rgb(0xc2e0b3),
                rgb(0xadd699),
                rgb(0x99cc80),
                rgb(0x85c266),
                rgb(0x70b84d),
                rgb(0x5cad33),
                rgb(0x47a31a),
                rgb(0x339900),
            ],
            gap: rgb(0x666666),
            rule: rgb(0x000000),
            separator: rgb(0x333333),
            border: rgb(0x000000),
            text: rgb(0xffffff),
            panel: rgb(0x505357),
            check: rgb(0x00ff00),
            cross: rgb(0xff0000),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PanelItem {
    Text { x: i64, y: i64, text: String },
    Underline { x: i64, y: i64, width: i64 },
    Mark { x: i64, y: i64, mark: Mark },
}

/// Side panel contents positioned relative to the panel's top-left corner
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PanelLayout {
    pub height: u32,
    pub items: Vec<PanelItem>,
}

/// Cuts `label` to `max_chars`, ending in "..." when it had to be cut
///
/// # Examples
/// ```
/// use rendezvous_libs::render::truncate_label;
///
/// assert_eq!(truncate_label("alice", 13), "alice");
/// assert_eq!(truncate_label("bartholomew_the_third", 13), "bartholome...");
/// ```
pub fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        label.to_string()
    } else {
        let keep = max_chars.saturating_sub(ELLIPSIS.len());
        label.chars().take(keep).chain(ELLIPSIS.chars()).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Renderer {
    pub layout: Layout,
    pub palette: Palette,
    display_names: BTreeMap<UserId, String>,
}

impl Renderer {
    pub fn new(layout: Layout, palette: Palette) -> Self {
        Renderer {
            layout,
            palette,
            display_names: BTreeMap::new(),
        }
    }

    /// Labels users by these names instead of their ids
    pub fn with_display_names(mut self, display_names: BTreeMap<UserId, String>) -> Self {
        self.display_names = display_names;
        self
    }

    fn user_label(&self, user: &str) -> String {
        let name = self.display_names.get(user).map_or(user, String::as_str);
        truncate_label(name, self.layout.label_max_chars)
    }

    /// Heatmap of `availability` over `days` x `ranges` with the top windows
    /// beside it. Equal inputs always give identical pixels
    pub fn render(
        &self,
        days: &[Weekday],
        ranges: &[TimeRange],
        availability: &Availability,
    ) -> RgbaImage {
        let l = &self.layout;
        let grid = compute_occupancy(days, ranges, availability);

        if grid.is_empty() {
            debug!("no days or ranges, rendering placeholder");
            return RgbaImage::from_pixel(l.placeholder_size, l.placeholder_size, self.palette.placeholder);
        }

        let windows = compute_top_windows(&grid.days, ranges, availability, l.window_count);
        let panel = self.layout_panel(&windows, grid.total_users);

        let heatmap_width = l.label_width + l.cell_width * grid.days.len() as u32;
        let grid_bottom = l.padding + l.cell_height * grid.rows.len() as u32;
        let panel_x = heatmap_width + l.gutter;
        let width = panel_x + l.panel_width + l.right_padding;
        let height = (grid_bottom + l.padding).max(l.padding + panel.height + l.padding);

        let mut canvas = Canvas::new(width, height, self.palette.background);
        self.draw_grid(&mut canvas, &grid);
        self.draw_panel(&mut canvas, &panel, panel_x);

        debug!("rendered {}x{} heatmap, {} windows", width, height, windows.len());
        canvas.into_image()
    }

    pub fn render_png(
        &self,
        days: &[Weekday],
        ranges: &[TimeRange],
        availability: &Availability,
    ) -> Result<Vec<u8>, RenderError> {
        encode_png(&self.render(days, ranges, availability))
    }

    fn draw_grid(&self, canvas: &mut Canvas, grid: &OccupancyGrid) {
        let l = &self.layout;
        let p = &self.palette;
        let scale = l.text_scale;
        let text_h = i64::from(text_height(scale));

        let cell_w = i64::from(l.cell_width);
        let cell_h = i64::from(l.cell_height);
        let columns = grid.days.len() as i64;
        let left = i64::from(l.label_width);
        let right = left + cell_w * columns;
        let top = i64::from(l.padding);
        let bottom = top + cell_h * grid.rows.len() as i64;
        let row_y = |i: usize| top + i as i64 * cell_h;

        for (i, row) in grid.rows.iter().enumerate() {
            match row {
                Row::Gap => canvas.fill_rect(left, row_y(i), right - left, cell_h, p.gap),
                Row::Tick { cells, .. } => {
                    for (j, cell) in cells.iter().enumerate() {
                        canvas.fill_rect(left + j as i64 * cell_w, row_y(i), cell_w, cell_h, p.buckets[cell.bucket()]);
                    }
                }
            }
        }

        for (i, row) in grid.rows.iter().enumerate() {
            if let Row::Tick {
                range, first, last, ..
            } = row
            {
                let y = row_y(i);
                let start = range.start();
                let thickness = if start.is_on_the_hour() {
                    3
                } else if start.is_on_the_half_hour() {
                    2
                } else {
                    1
                };
                canvas.hline(left, right, y, thickness, p.rule);

                if *first || start.is_on_the_half_hour() {
                    canvas.text_right(left - LABEL_MARGIN, y - text_h / 2, &start.to_string(), scale, p.text);
                }

                if *last {
                    let end_y = y + cell_h;
                    canvas.hline(left, right, end_y, 3, p.rule);
                    canvas.text_right(left - LABEL_MARGIN, end_y - text_h / 2, &range.end().to_string(), scale, p.text);
                }
            }
        }

        for j in 1..columns {
            canvas.vline(left + j * cell_w, top, bottom, 3, p.separator);
        }
        canvas.stroke_rect(left, top, right, bottom, 4, p.border);

        for (j, day) in grid.days.iter().enumerate() {
            let center = left + j as i64 * cell_w + cell_w / 2;
            canvas.text_centered(center, (top - text_h) / 2, day.name(), scale, p.text);
        }
    }

    pub(crate) fn layout_panel(&self, windows: &[OptimalWindow], total_users: usize) -> PanelLayout {
        let l = &self.layout;
        let inset = i64::from(l.panel_inset);
        let line = i64::from(l.line_height);

        let mut items = Vec::new();
        let mut y = inset;

        if windows.is_empty() {
            items.push(PanelItem::Text {
                x: inset,
                y,
                text: "No responses yet.".to_string(),
            });
            y += line;
        }

        for (i, window) in windows.iter().enumerate() {
            if i > 0 {
                y += i64::from(l.entry_spacing);
            }

            items.push(PanelItem::Text {
                x: inset,
                y,
                text: format!(
                    "{} {} ({}/{})",
                    window.day,
                    window.range,
                    window.attend_count(),
                    total_users
                ),
            });
            y += line;

            y = self.layout_user_list(&mut items, "Available:", &window.attending, Mark::Check, y);
            y = self.layout_user_list(&mut items, "Not Available:", &window.absent, Mark::Cross, y);
        }

        PanelLayout {
            height: (y + inset).max(i64::from(l.min_panel_height)) as u32,
            items,
        }
    }

    /// Heading plus marked user labels, wrapped to the panel width. Returns
    /// the top of the next line
    fn layout_user_list(
        &self,
        items: &mut Vec<PanelItem>,
        heading: &str,
        users: &BTreeSet<UserId>,
        mark: Mark,
        mut y: i64,
    ) -> i64 {
        let l = &self.layout;
        let scale = l.text_scale;
        let inset = i64::from(l.panel_inset);
        let line = i64::from(l.line_height);
        let icon = i64::from(l.icon_size);
        let text_h = i64::from(text_height(scale));
        let max_width = i64::from(l.panel_width) - 2 * inset;

        items.push(PanelItem::Text {
            x: inset,
            y,
            text: heading.to_string(),
        });
        items.push(PanelItem::Underline {
            x: inset,
            y: y + text_h + 1,
            width: i64::from(text_width(heading, scale)),
        });
        y += line;

        let mut row_width = 0;
        for user in users {
            let label = self.user_label(user);
            let element = icon + ICON_GAP + i64::from(text_width(&label, scale)) + ITEM_GAP;

            if row_width + element > max_width && row_width != 0 {
                row_width = 0;
                y += line;
            }

            items.push(PanelItem::Mark {
                x: inset + row_width,
                y: y + (text_h - icon) / 2,
                mark,
            });
            items.push(PanelItem::Text {
                x: inset + row_width + icon + ICON_GAP,
                y,
                text: label,
            });
            row_width += element;
        }

        y + line
    }

    fn draw_panel(&self, canvas: &mut Canvas, panel: &PanelLayout, panel_x: u32) {
        let l = &self.layout;
        let p = &self.palette;
        let scale = l.text_scale;
        let text_h = i64::from(text_height(scale));

        let x0 = i64::from(panel_x);
        let y0 = i64::from(l.padding);
        let width = i64::from(l.panel_width);
        let height = i64::from(panel.height);

        canvas.fill_rect(x0, y0, width, height, p.panel);
        canvas.stroke_rect(x0, y0, x0 + width, y0 + height, 4, p.border);
        canvas.text_centered(
            x0 + width / 2,
            (y0 - text_h) / 2,
            &format!("Top {} Time Ranges", l.window_count),
            scale,
            p.text,
        );

        for item in &panel.items {
            match item {
                PanelItem::Text { x, y, text } => canvas.text(x0 + x, y0 + y, text, scale, p.text),
                PanelItem::Underline { x, y, width } => canvas.fill_rect(x0 + x, y0 + y, *width, 1, p.text),
                PanelItem::Mark { x, y, mark } => {
                    let color = match mark {
                        Mark::Check => p.check,
                        Mark::Cross => p.cross,
                    };
                    canvas.mark(*mark, x0 + x, y0 + y, l.icon_size, color);
                }
            }
        }
    }
}

/// Renders with the default layout and palette
pub fn render(days: &[Weekday], ranges: &[TimeRange], availability: &Availability) -> RgbaImage {
    Renderer::default().render(days, ranges, availability)
}

/// 8-bit RGBA PNG of `image`
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, RenderError> {
    let mut buffer = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut buffer, image.width(), image.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder.write_header()?;
        writer.write_image_data(image.as_raw())?;
        writer.finish()?;
    }

    Ok(buffer)
}

/// PNG heatmap with the default layout and palette
pub fn compute_heatmap(
    days: &[Weekday],
    ranges: &[TimeRange],
    availability: &Availability,
) -> Result<Vec<u8>, RenderError> {
    encode_png(&render(days, ranges, availability))
}
