use image::{ImageBuffer, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::core::{CELLS_PER_COLUMN, CardRecord, Cell, ColumnLabel};
use crate::export::{RenderAdapter, RenderError};

/// Face size before raster scaling: 4 px per millimetre of a 90×130 mm card.
pub const FACE_WIDTH: u32 = 360;
pub const FACE_HEIGHT: u32 = 520;
pub const GLYPH_WIDTH: usize = 5;
pub const GLYPH_HEIGHT: usize = 7;

const MARGIN: u32 = 20;
const HEADER_HEIGHT: u32 = 80;
const LETTER_TOP: u32 = 94;
const GRID_TOP: u32 = 150;
const CELL_SIZE: u32 = 64;
const FOOTER_TOP: u32 = GRID_TOP + CELL_SIZE * CELLS_PER_COLUMN as u32 + 18;
const LINE_WIDTH: u32 = 2;

/// Colour schemes for card faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CardStyle {
    #[default]
    Classic,
    Night,
    /// Greyscale, for cheap printing.
    Mono,
}

/// Rendered face of one card.
#[derive(Debug, Clone)]
pub struct CardFace {
    pub serial: u32,
    pub image: RgbaImage,
}

struct Palette {
    card_bg: Rgba<u8>,
    header_bg: Rgba<u8>,
    header_text: Rgba<u8>,
    letter: Rgba<u8>,
    grid: Rgba<u8>,
    number: Rgba<u8>,
    free_bg: Rgba<u8>,
    free_text: Rgba<u8>,
    footer: Rgba<u8>,
}

/// [`RenderAdapter`] painting bingo cards into RGBA images.
///
/// While staging is open the blank card (background, header band, column letters, grid) is
/// painted once and cloned for every card.
#[derive(Debug, Default)]
pub struct CardPainter {
    style: CardStyle,
    template: Option<RgbaImage>,
}

impl CardPainter {
    pub fn new(style: CardStyle) -> Self {
        Self {
            style,
            template: None,
        }
    }

    pub fn style(&self) -> CardStyle {
        self.style
    }

    /// Paint a single card without going through the staging cycle.
    pub fn paint(&self, card: &CardRecord) -> RgbaImage {
        let mut image = match &self.template {
            Some(template) => template.clone(),
            None => paint_template(&palette(self.style)),
        };
        paint_card(&mut image, card, &palette(self.style));
        image
    }
}

impl RenderAdapter for CardPainter {
    type Artifact = CardFace;

    fn open_staging(&mut self) -> Result<(), RenderError> {
        self.template = Some(paint_template(&palette(self.style)));
        Ok(())
    }

    fn render(&mut self, card: &CardRecord) -> Result<CardFace, RenderError> {
        Ok(CardFace {
            serial: card.serial,
            image: self.paint(card),
        })
    }

    fn close_staging(&mut self) {
        self.template = None;
    }
}

fn paint_template(palette: &Palette) -> RgbaImage {
    let mut img = ImageBuffer::from_pixel(FACE_WIDTH, FACE_HEIGHT, palette.card_bg);
    draw_filled_rect_mut(
        &mut img,
        Rect::at(0, 0).of_size(FACE_WIDTH, HEADER_HEIGHT),
        palette.header_bg,
    );
    draw_hollow_rect_mut(
        &mut img,
        Rect::at(0, 0).of_size(FACE_WIDTH, FACE_HEIGHT),
        palette.grid,
    );

    for label in ColumnLabel::ALL {
        let center = cell_center_x(label.index());
        draw_text_centered(
            &mut img,
            &label.letter().to_string(),
            center,
            LETTER_TOP,
            palette.letter,
            6,
        );
    }

    let grid_size = CELL_SIZE * CELLS_PER_COLUMN as u32;
    for i in 0..=CELLS_PER_COLUMN as u32 {
        let offset = i * CELL_SIZE;
        draw_filled_rect_mut(
            &mut img,
            Rect::at((MARGIN + offset) as i32, GRID_TOP as i32)
                .of_size(LINE_WIDTH, grid_size + LINE_WIDTH),
            palette.grid,
        );
        draw_filled_rect_mut(
            &mut img,
            Rect::at(MARGIN as i32, (GRID_TOP + offset) as i32)
                .of_size(grid_size + LINE_WIDTH, LINE_WIDTH),
            palette.grid,
        );
    }
    img
}

fn paint_card(img: &mut RgbaImage, card: &CardRecord, palette: &Palette) {
    let label = fit_text(&card.label, FACE_WIDTH - 2 * MARGIN, 3);
    draw_text_centered(
        img,
        &label,
        FACE_WIDTH / 2,
        (HEADER_HEIGHT - GLYPH_HEIGHT as u32 * 3) / 2,
        palette.header_text,
        3,
    );

    for (col, column) in card.columns.iter().enumerate() {
        let center_x = cell_center_x(col);
        for (row, cell) in column.cells.iter().enumerate() {
            let top = GRID_TOP + row as u32 * CELL_SIZE;
            match cell {
                Cell::Number(n) => {
                    let y = top + (CELL_SIZE - GLYPH_HEIGHT as u32 * 4) / 2;
                    draw_text_centered(img, &n.to_string(), center_x, y, palette.number, 4);
                }
                Cell::Free => {
                    let left = MARGIN + col as u32 * CELL_SIZE + LINE_WIDTH;
                    draw_filled_rect_mut(
                        img,
                        Rect::at(left as i32, (top + LINE_WIDTH) as i32)
                            .of_size(CELL_SIZE - LINE_WIDTH, CELL_SIZE - LINE_WIDTH),
                        palette.free_bg,
                    );
                    let y = top + (CELL_SIZE - GLYPH_HEIGHT as u32 * 2) / 2;
                    draw_text_centered(img, "FREE", center_x, y, palette.free_text, 2);
                }
            }
        }
    }

    draw_text(
        img,
        &format!("#{:04}", card.serial),
        MARGIN as i32,
        FOOTER_TOP as i32,
        palette.footer,
        2,
    );
    let date = card.created_at.format("%Y-%m-%d").to_string();
    let date_x = FACE_WIDTH - MARGIN - text_width(&date, 2);
    draw_text(img, &date, date_x as i32, FOOTER_TOP as i32, palette.footer, 2);
}

fn cell_center_x(col: usize) -> u32 {
    MARGIN + col as u32 * CELL_SIZE + CELL_SIZE / 2 + LINE_WIDTH / 2
}

/// Uppercase `text` and cut it to what fits in `max_width` pixels at `scale`.
fn fit_text(text: &str, max_width: u32, scale: u32) -> String {
    let advance = (GLYPH_WIDTH as u32 + 1) * scale;
    let max_chars = ((max_width + scale) / advance) as usize;
    text.trim()
        .chars()
        .take(max_chars)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

fn text_width(text: &str, scale: u32) -> u32 {
    let chars = text.chars().count() as u32;
    if chars == 0 {
        return 0;
    }
    chars * (GLYPH_WIDTH as u32 + 1) * scale - scale
}

fn draw_text_centered(
    img: &mut RgbaImage,
    text: &str,
    center_x: u32,
    y: u32,
    color: Rgba<u8>,
    scale: u32,
) {
    let x = center_x as i32 - (text_width(text, scale) / 2) as i32;
    draw_text(img, text, x, y as i32, color, scale);
}

fn draw_text(img: &mut RgbaImage, text: &str, x: i32, y: i32, color: Rgba<u8>, scale: u32) {
    let advance = ((GLYPH_WIDTH as u32 + 1) * scale) as i32;
    for (i, ch) in text.chars().enumerate() {
        draw_glyph(img, x + i as i32 * advance, y, ch, color, scale);
    }
}

fn palette(style: CardStyle) -> Palette {
    match style {
        CardStyle::Classic => Palette {
            card_bg: rgba(0xff, 0xfd, 0xf7),
            header_bg: rgba(0xc6, 0x28, 0x28),
            header_text: rgba(0xff, 0xff, 0xff),
            letter: rgba(0xc6, 0x28, 0x28),
            grid: rgba(0x3a, 0x3a, 0x3a),
            number: rgba(0x1a, 0x1a, 0x1a),
            free_bg: rgba(0xff, 0xd5, 0x4f),
            free_text: rgba(0x8a, 0x1c, 0x1c),
            footer: rgba(0x75, 0x75, 0x75),
        },
        CardStyle::Night => Palette {
            card_bg: rgba(0x1b, 0x22, 0x38),
            header_bg: rgba(0x5c, 0x6b, 0xc0),
            header_text: rgba(0xf5, 0xf5, 0xf5),
            letter: rgba(0xff, 0xca, 0x28),
            grid: rgba(0x9f, 0xa8, 0xda),
            number: rgba(0xf5, 0xf5, 0xf5),
            free_bg: rgba(0xff, 0xca, 0x28),
            free_text: rgba(0x1b, 0x22, 0x38),
            footer: rgba(0x9f, 0xa8, 0xda),
        },
        CardStyle::Mono => Palette {
            card_bg: rgba(0xff, 0xff, 0xff),
            header_bg: rgba(0x20, 0x20, 0x20),
            header_text: rgba(0xff, 0xff, 0xff),
            letter: rgba(0x20, 0x20, 0x20),
            grid: rgba(0x20, 0x20, 0x20),
            number: rgba(0x00, 0x00, 0x00),
            free_bg: rgba(0xd0, 0xd0, 0xd0),
            free_text: rgba(0x00, 0x00, 0x00),
            footer: rgba(0x60, 0x60, 0x60),
        },
    }
}

fn rgba(r: u8, g: u8, b: u8) -> Rgba<u8> {
    Rgba([r, g, b, 0xff])
}

fn draw_glyph(img: &mut RgbaImage, x: i32, y: i32, ch: char, color: Rgba<u8>, scale: u32) {
    let pattern = glyph_pattern(ch);
    for (row, bits) in pattern.iter().enumerate() {
        for col in 0..GLYPH_WIDTH {
            if bits & (1 << (GLYPH_WIDTH - 1 - col)) != 0 {
                let px = x + (col as i32 * scale as i32);
                let py = y + (row as i32 * scale as i32);
                draw_filled_rect_mut(img, Rect::at(px, py).of_size(scale, scale), color);
            }
        }
    }
}

#[rustfmt::skip]
fn glyph_pattern(ch: char) -> [u8; GLYPH_HEIGHT] {
    match ch.to_ascii_uppercase() {
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00110, 0b01000, 0b10000, 0b11111],
        '3' => [0b11110, 0b00001, 0b00001, 0b01110, 0b00001, 0b00001, 0b11110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'B' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => [0b11110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11110],
        'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
        'F' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000],
        'G' => [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01110],
        'H' => [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'I' => [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'J' => [0b00111, 0b00010, 0b00010, 0b00010, 0b10010, 0b10010, 0b01100],
        'K' => [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'M' => [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
        'N' => [0b10001, 0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
        'Q' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'V' => [0b10001, 0b10001, 0b10001, 0b01010, 0b01010, 0b00100, 0b00100],
        'W' => [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010],
        'X' => [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001],
        'Y' => [0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100],
        'Z' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111],
        '#' => [0b01010, 0b11111, 0b01010, 0b01010, 0b11111, 0b01010, 0b01010],
        '-' => [0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000],
        '.' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00110, 0b00110],
        ':' => [0b00000, 0b00100, 0b00000, 0b00000, 0b00100, 0b00000, 0b00000],
        '!' => [0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00000, 0b00100],
        '?' => [0b01110, 0b10001, 0b00010, 0b00100, 0b00100, 0b00000, 0b00100],
        '&' => [0b01100, 0b10010, 0b10100, 0b01000, 0b10101, 0b10010, 0b01101],
        '\'' => [0b00100, 0b00100, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000],
        _ => [0b00000; GLYPH_HEIGHT],
    }
}
