// SPDX-License-Identifier: GPL-3.0-only

//! Interactive photo booth widget
//!
//! Renders the live preview (and the captured image during review) to the
//! terminal using Unicode half-block characters for improved vertical
//! resolution. The preview shows exactly what a capture will produce: the
//! centered square crop with the selected overlay blended on top.

use crate::backends::camera::types::{CameraFacing, CameraFrame};
use crate::compositor::square_crop;
use crate::config::{self, Config};
use crate::constants::POLL_INTERVAL;
use crate::session::CaptureSession;
use crate::storage;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use image::RgbaImage;
use ratatui::{
    Terminal, backend::CrosstermBackend, buffer::Buffer, layout::Rect, style::Color,
    widgets::Widget,
};
use std::io::{self, stdout};
use std::sync::Arc;
use tracing::{error, warn};

/// Run the photo booth widget
pub fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, config);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut config: Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;

    let mut session = CaptureSession::new(config.facing, config.overlay_index());
    if let Err(err) = session.start() {
        // Degrade to the placeholder preview; capture stays unavailable
        // until frames arrive, but the widget keeps running.
        warn!(error = %err, "Camera unavailable");
    }

    let mut preview_overlay = load_preview_overlay(&rt, &mut session);
    let mut status_message = status_line(&session);
    let save_dir = config
        .save_dir
        .clone()
        .unwrap_or_else(storage::default_save_dir);

    loop {
        session.poll_frame();

        terminal.draw(|f| {
            let area = f.area();
            let stage = Rect {
                x: area.x,
                y: area.y,
                width: area.width,
                height: area.height.saturating_sub(1),
            };

            if let Some(captured) = session.state().captured() {
                f.render_widget(ReviewWidget { image: &captured.image }, stage);
            } else {
                let mirror =
                    config.mirror_preview && session.facing() == CameraFacing::Front;
                f.render_widget(
                    &PreviewWidget {
                        frame: session.current_frame(),
                        overlay: preview_overlay.as_deref(),
                        mirror,
                    },
                    stage,
                );
            }

            let status_area = Rect {
                x: area.x,
                y: area.height.saturating_sub(1),
                width: area.width,
                height: 1,
            };
            f.render_widget(
                StatusBar {
                    message: &status_message,
                },
                status_area,
            );
        })?;

        if event::poll(POLL_INTERVAL)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            if key.code == KeyCode::Char('q')
                || (key.code == KeyCode::Char('c')
                    && key.modifiers.contains(KeyModifiers::CONTROL))
            {
                break;
            }

            if session.state().is_live() {
                match key.code {
                    KeyCode::Char('p') | KeyCode::Char(' ') => {
                        match rt.block_on(session.capture()) {
                            Ok(()) => status_message = status_line(&session),
                            Err(err) => {
                                error!(error = %err, "Capture failed");
                                status_message = format!("Error: {}", err);
                            }
                        }
                    }
                    KeyCode::Char('f') => {
                        session.cycle_overlay();
                        preview_overlay = load_preview_overlay(&rt, &mut session);
                        status_message = status_line(&session);
                    }
                    KeyCode::Char('s') if session.has_multiple_cameras() => {
                        match session.flip_camera() {
                            Ok(()) => status_message = status_line(&session),
                            Err(err) => {
                                error!(error = %err, "Camera switch failed");
                                status_message = format!("Error: {}", err);
                            }
                        }
                    }
                    _ => {}
                }
            } else {
                match key.code {
                    KeyCode::Char('d') => match session.download(&save_dir) {
                        Ok(path) => {
                            status_message = format!("Saved: {}", path.display());
                        }
                        Err(err) => {
                            error!(error = %err, "Download failed");
                            status_message = format!("Error: {}", err);
                        }
                    },
                    KeyCode::Char('r') | KeyCode::Esc => match session.reset() {
                        Ok(()) => status_message = status_line(&session),
                        Err(err) => {
                            error!(error = %err, "Could not restart stream");
                            status_message = format!("Error: {}", err);
                        }
                    },
                    _ => {}
                }
            }
        }
    }

    // Remember the last-used facing and overlay for the next session
    config.facing = session.facing();
    config.overlay = session.selector().current().map(|g| g.id.to_string());
    config::save(&config);

    session.stop();
    Ok(())
}

/// Decode the selected overlay for preview rendering.
///
/// A decode failure only degrades the preview; the capture path performs
/// its own load and surfaces the error there.
fn load_preview_overlay(
    rt: &tokio::runtime::Runtime,
    session: &mut CaptureSession,
) -> Option<Arc<RgbaImage>> {
    match rt.block_on(session.overlay_image()) {
        Ok(overlay) => overlay,
        Err(err) => {
            warn!(error = %err, "Overlay preview unavailable");
            None
        }
    }
}

fn status_line(session: &CaptureSession) -> String {
    if session.state().is_reviewing() {
        return "'d' download | 'r' retake | 'q' quit".to_string();
    }

    let overlay = session
        .selector()
        .current()
        .map(|g| g.label)
        .unwrap_or("none");
    let mut msg = format!("'p' capture | 'f' frame: {}", overlay);
    if session.has_multiple_cameras() {
        msg.push_str(&format!(" | 's' flip ({})", session.facing()));
    }
    msg.push_str(" | 'q' quit");
    msg
}

/// Live preview: the centered square crop of the current frame with the
/// selected overlay blended on top
struct PreviewWidget<'a> {
    frame: Option<Arc<CameraFrame>>,
    overlay: Option<&'a RgbaImage>,
    mirror: bool,
}

impl Widget for &PreviewWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(frame) = &self.frame else {
            render_placeholder(area, buf, "Waiting for camera...");
            return;
        };
        if frame.width == 0 || frame.height == 0 {
            render_placeholder(area, buf, "Waiting for camera...");
            return;
        }

        let (size, offset_x, offset_y) = square_crop(frame.width, frame.height);
        let overlay = self.overlay;
        let mirror = self.mirror;

        render_square(area, buf, |u, v| {
            let u = if mirror { 1.0 - u } else { u };
            let sx = offset_x + ((u * size as f64) as u32).min(size - 1);
            let sy = offset_y + ((v * size as f64) as u32).min(size - 1);
            let mut rgb = frame.pixel(sx, sy);

            if let Some(overlay) = overlay {
                let ox = ((u * overlay.width() as f64) as u32).min(overlay.width() - 1);
                let oy = ((v * overlay.height() as f64) as u32).min(overlay.height() - 1);
                rgb = blend(rgb, overlay.get_pixel(ox, oy).0);
            }

            rgb
        });
    }
}

/// Review screen: the captured composite, already square
struct ReviewWidget<'a> {
    image: &'a RgbaImage,
}

impl Widget for ReviewWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (width, height) = self.image.dimensions();
        if width == 0 || height == 0 {
            return;
        }

        render_square(area, buf, |u, v| {
            let x = ((u * width as f64) as u32).min(width - 1);
            let y = ((v * height as f64) as u32).min(height - 1);
            let p = self.image.get_pixel(x, y).0;
            (p[0], p[1], p[2])
        });
    }
}

/// Render a square image into the area using half-block characters.
///
/// `sample` receives normalized coordinates in [0, 1).
fn render_square(area: Rect, buf: &mut Buffer, sample: impl Fn(f64, f64) -> (u8, u8, u8)) {
    // Each terminal cell shows two vertical pixels via '▀' (fg = upper,
    // bg = lower), so a cell is roughly square at 1x2.
    let width_px = area.width as u32;
    let height_px = area.height as u32 * 2;
    let side_px = width_px.min(height_px);
    if side_px == 0 {
        return;
    }

    let display_width = side_px as u16;
    let display_height = (side_px / 2) as u16;
    let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
    let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

    for ty in 0..display_height {
        for tx in 0..display_width {
            let term_x = x_offset + tx;
            let term_y = y_offset + ty;
            if term_x >= area.x + area.width || term_y >= area.y + area.height {
                continue;
            }

            let u = tx as f64 / side_px as f64;
            let v_top = (ty as f64 * 2.0) / side_px as f64;
            let v_bottom = (ty as f64 * 2.0 + 1.0) / side_px as f64;

            let (tr, tg, tb) = sample(u, v_top);
            let (br, bg, bb) = sample(u, v_bottom);

            if let Some(cell) = buf.cell_mut((term_x, term_y)) {
                cell.set_char('▀');
                cell.set_fg(Color::Rgb(tr, tg, tb));
                cell.set_bg(Color::Rgb(br, bg, bb));
            }
        }
    }
}

fn render_placeholder(area: Rect, buf: &mut Buffer, msg: &str) {
    let x = area.x + (area.width.saturating_sub(msg.len() as u16)) / 2;
    let y = area.y + area.height / 2;
    if y < area.y + area.height && x < area.x + area.width {
        buf.set_string(x, y, msg, ratatui::style::Style::default());
    }
}

/// Alpha-blend an overlay pixel onto an opaque RGB pixel
fn blend(under: (u8, u8, u8), over: [u8; 4]) -> (u8, u8, u8) {
    let alpha = over[3] as u32;
    if alpha == 255 {
        return (over[0], over[1], over[2]);
    }
    if alpha == 0 {
        return under;
    }

    let mix = |o: u8, u: u8| -> u8 {
        ((o as u32 * alpha + u as u32 * (255 - alpha)) / 255) as u8
    };
    (
        mix(over[0], under.0),
        mix(over[1], under.1),
        mix(over[2], under.2),
    )
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        let text = if self.message.len() > area.width as usize {
            &self.message[..area.width as usize]
        } else {
            self.message
        };

        buf.set_string(
            area.x,
            area.y,
            text,
            ratatui::style::Style::default()
                .fg(Color::White)
                .bg(Color::DarkGray),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_respects_alpha_extremes() {
        assert_eq!(blend((10, 20, 30), [200, 100, 50, 255]), (200, 100, 50));
        assert_eq!(blend((10, 20, 30), [200, 100, 50, 0]), (10, 20, 30));
    }

    #[test]
    fn blend_mixes_half_alpha() {
        let (r, g, b) = blend((0, 0, 0), [255, 255, 255, 128]);
        assert!((126..=130).contains(&r));
        assert_eq!(r, g);
        assert_eq!(g, b);
    }
}
