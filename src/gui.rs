//! Managed-canvas playback GUI.
//!
//! The cooperative counterpart to [`crate::surface::VideoWindow`]: instead
//! of a blocking key poll, the host event loop repaints the app on a fixed
//! ~15 ms timer and each tick renders at most one frame — no blocking
//! calls happen inside a tick. Pause/resume and step-back arrive as
//! discrete button events rather than key codes, and the step-back button
//! is enabled only while playback is paused.

use std::time::Duration;

use eframe::egui;

use crate::{
    controller::{PlaybackController, PlaybackState},
    error::PlaybackError,
    source::Frame,
};

/// Delay between cooperative ticks while playing.
const TICK_DELAY: Duration = Duration::from_millis(15);

/// Room reserved below the canvas for the control buttons.
const CONTROLS_HEIGHT: f32 = 70.0;

/// Copy a frame into an egui texture image.
fn to_color_image(frame: &Frame) -> egui::ColorImage {
    egui::ColorImage::from_rgb(
        [frame.width() as usize, frame.height() as usize],
        frame.as_raw(),
    )
}

/// The eframe application: a canvas fit to the video resolution plus
/// Pause/Play and Step Back buttons.
struct CanvasApp {
    controller: PlaybackController,
    texture: Option<egui::TextureHandle>,
}

impl CanvasApp {
    fn set_texture(&mut self, ctx: &egui::Context, image: egui::ColorImage) {
        match &mut self.texture {
            Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
            None => {
                self.texture = Some(ctx.load_texture("frame", image, egui::TextureOptions::LINEAR));
            }
        }
    }
}

impl eframe::App for CanvasApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // One frame per tick while playing. The frame bytes are copied out
        // before the texture update so the controller borrow ends first.
        if self.controller.state() == PlaybackState::Playing {
            let image = match self.controller.advance() {
                Ok(Some(frame)) => Some(to_color_image(frame)),
                Ok(None) => {
                    // End of stream: close the window.
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    None
                }
                Err(error) => {
                    log::error!("playback failed: {error}");
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    None
                }
            };
            if let Some(image) = image {
                self.set_texture(ctx, image);
            }
        }

        egui::TopBottomPanel::bottom("controls")
            .exact_height(CONTROLS_HEIGHT)
            .show(ctx, |ui| {
                ui.vertical_centered_justified(|ui| {
                    let paused = self.controller.state() == PlaybackState::Paused;
                    let pause_label = if paused { "Play" } else { "Pause" };
                    if ui.button(pause_label).clicked() {
                        self.controller.toggle_pause();
                    }

                    let paused = self.controller.state() == PlaybackState::Paused;
                    if ui
                        .add_enabled(paused, egui::Button::new("Step Back"))
                        .clicked()
                    {
                        let image = match self.controller.step_back() {
                            Ok(Some(frame)) => Some(to_color_image(frame)),
                            Ok(None) => None,
                            Err(error) => {
                                log::error!("step back failed: {error}");
                                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                                None
                            }
                        };
                        if let Some(image) = image {
                            self.set_texture(ctx, image);
                        }
                    }
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(texture) = &self.texture {
                ui.image((texture.id(), texture.size_vec2()));
            }
        });

        // Reschedule the next tick. While paused the app repaints only on
        // interaction, so no frames advance until Play is pressed.
        if self.controller.state() == PlaybackState::Playing {
            ctx.request_repaint_after(TICK_DELAY);
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Err(error) = self.controller.stop() {
            log::error!("failed to finalize playback: {error}");
        }
    }
}

/// Run the managed-canvas player until end of stream or window close.
///
/// `width`/`height` size the canvas to the source resolution.
///
/// # Errors
///
/// Returns [`PlaybackError::Window`] if the native event loop cannot be
/// started.
pub fn run(
    controller: PlaybackController,
    title: &str,
    width: u32,
    height: u32,
) -> Result<(), PlaybackError> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([width as f32, height as f32 + CONTROLS_HEIGHT])
            .with_resizable(false),
        ..Default::default()
    };
    eframe::run_native(
        title,
        options,
        Box::new(move |_cc| {
            Ok(Box::new(CanvasApp {
                controller,
                texture: None,
            }))
        }),
    )
    .map_err(|error| PlaybackError::Window(error.to_string()))
}
