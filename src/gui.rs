use crate::display::PrimaryDisplay;
use crate::overlay::Overlay;
use crossbeam_channel::{unbounded, Receiver, Sender};
use lumascreen::compositor::CompositeMode;
use lumascreen::params::{MAX_BRIGHTNESS_PERCENT, MAX_THICKNESS, MIN_BRIGHTNESS_PERCENT, MIN_THICKNESS};
use lumascreen::{Color, GeometryChange, GeometryTracker, LaunchConfig, ParamEvent, ParameterStore, Preset, Profile};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Panel actions that are not parameter changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PanelCommand {
    ToggleLight,
    Panic,
    CloseAll,
}

pub struct ControlPanel {
    store: ParameterStore,
    profile: Profile,
    tracker: GeometryTracker,
    overlay: Overlay,
    event_tx: Sender<ParamEvent>,
    event_rx: Receiver<ParamEvent>,
    command_tx: Sender<PanelCommand>,
    command_rx: Receiver<PanelCommand>,
    brightness_percent: f64,
    thickness: f64,
    color: [u8; 3],
    hex_input: String,
    status_message: Option<String>,
    dragging: bool,
}

impl ControlPanel {
    pub fn new(config: &LaunchConfig) -> Self {
        let store = ParameterStore::new(config.profile);
        let (event_tx, event_rx) = unbounded();
        let (command_tx, command_rx) = unbounded();

        info!(
            "Control panel created (profile {}, mode {})",
            config.profile.name(),
            config.mode()
        );

        let mut panel = Self {
            profile: config.profile,
            tracker: GeometryTracker::new(config.poll_interval()),
            overlay: Overlay::new(config.mode(), config.poll_interval()),
            event_tx,
            event_rx,
            command_tx,
            command_rx,
            brightness_percent: 0.0,
            thickness: 0.0,
            color: [255, 255, 255],
            hex_input: String::new(),
            status_message: None,
            dragging: false,
            store,
        };
        panel.sync_widgets();
        panel
    }

    /// Pulls the widget mirrors back from the store, so presets and clamped
    /// values show up in the sliders.
    fn sync_widgets(&mut self) {
        self.brightness_percent = self.store.brightness_percent() as f64;
        self.thickness = self.store.thickness() as f64;
        self.color = self.store.color().to_array();
        self.hex_input = self.store.color().to_hex();
    }

    fn drain_events(&mut self) {
        let mut applied = 0;
        while let Ok(event) = self.event_rx.try_recv() {
            debug!("Applying {:?}", event);
            if let Some(warning) = self.store.apply(event) {
                self.status_message = Some(warning.to_string());
            }
            applied += 1;
        }
        if applied > 0 {
            self.sync_widgets();
        }
    }

    fn drain_commands(&mut self, ctx: &egui::Context) {
        while let Ok(command) = self.command_rx.try_recv() {
            match command {
                PanelCommand::ToggleLight => self.overlay.toggle(),
                PanelCommand::Panic => self.overlay.panic_off(),
                PanelCommand::CloseAll => {
                    info!("Close All pressed - shutting down");
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            }
        }
    }

    fn poll_geometry(&mut self, ctx: &egui::Context, now: Instant) {
        let display = PrimaryDisplay::new(ctx);
        match self.tracker.poll_if_due(&display, now) {
            GeometryChange::Changed(bounds) => {
                info!(
                    "Primary display at ({}, {}) {}x{}",
                    bounds.x, bounds.y, bounds.width, bounds.height
                );
                self.overlay.set_bounds(bounds);
            }
            GeometryChange::NotDue | GeometryChange::Unchanged | GeometryChange::Unavailable => {}
        }
    }

    fn send(&self, event: ParamEvent) {
        if self.event_tx.send(event).is_err() {
            warn!("Parameter channel closed");
        }
    }

    fn command(&self, command: PanelCommand) {
        if self.command_tx.send(command).is_err() {
            warn!("Command channel closed");
        }
    }

    fn title_bar(&mut self, ctx: &egui::Context) {
        let title_bar_height = 32.0;
        let close_button_size = egui::vec2(46.0, title_bar_height);

        egui::TopBottomPanel::top("title_bar").exact_height(title_bar_height).show(ctx, |ui| {
            ui.horizontal_centered(|ui| {
                ui.add_space(8.0);

                let title_response = ui.interact(
                    egui::Rect::from_min_size(
                        ui.cursor().min,
                        egui::vec2(ui.available_width() - close_button_size.x, title_bar_height),
                    ),
                    ui.id().with("title_bar_drag"),
                    egui::Sense::click_and_drag(),
                );

                let primary_down = ctx.input(|i| i.pointer.primary_down());
                if title_response.is_pointer_button_down_on() && primary_down {
                    if !self.dragging {
                        debug!("Title bar drag started");
                        self.dragging = true;
                    }
                    ctx.send_viewport_cmd(egui::ViewportCommand::StartDrag);
                } else if self.dragging {
                    self.dragging = false;
                }

                ui.label(
                    egui::RichText::new("LumaScreen - Control Panel")
                        .size(14.0)
                        .strong()
                        .color(egui::Color32::from_rgb(220, 220, 220)),
                );

                ui.add_space(6.0);
                ui.label(
                    egui::RichText::new(env!("CARGO_PKG_VERSION"))
                        .size(10.0)
                        .color(egui::Color32::from_rgb(140, 140, 140)),
                );

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let close_response = ui.add_sized(
                        close_button_size,
                        egui::Button::new(egui::RichText::new("X").size(16.0)).frame(false),
                    );
                    if close_response.clicked() {
                        info!("Control panel closed");
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
            });
        });
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        ui.add_space(10.0);

        ui.horizontal(|ui| {
            let toggle_text = if self.overlay.is_visible() { "Turn Off" } else { "Turn On" };
            if ui.add(egui::Button::new(toggle_text).min_size(egui::vec2(110.0, 30.0))).clicked() {
                self.command(PanelCommand::ToggleLight);
            }

            let panic = egui::Button::new(egui::RichText::new("PANIC").strong().color(egui::Color32::WHITE))
                .fill(egui::Color32::from_rgb(180, 40, 40))
                .min_size(egui::vec2(110.0, 30.0));
            if ui.add(panic).on_hover_text("Hide the screen light immediately").clicked() {
                self.command(PanelCommand::Panic);
            }

            if ui.add(egui::Button::new("Close All").min_size(egui::vec2(110.0, 30.0))).clicked() {
                self.command(PanelCommand::CloseAll);
            }
        });

        ui.add_space(20.0);
        ui.separator();
        ui.add_space(15.0);

        egui::Grid::new("light_grid")
            .num_columns(2)
            .spacing([20.0, 10.0])
            .show(ui, |ui| {
                ui.label("Brightness:");
                let brightness = egui::Slider::new(
                    &mut self.brightness_percent,
                    MIN_BRIGHTNESS_PERCENT..=MAX_BRIGHTNESS_PERCENT,
                )
                .integer()
                .suffix("%");
                if ui.add(brightness).changed() {
                    self.send(ParamEvent::BrightnessPercent(self.brightness_percent));
                }
                ui.end_row();

                ui.label("Thickness:");
                let thickness = egui::Slider::new(&mut self.thickness, MIN_THICKNESS as f64..=MAX_THICKNESS as f64)
                    .integer()
                    .suffix(" px");
                if ui.add(thickness).changed() {
                    self.send(ParamEvent::Thickness(self.thickness));
                }
                ui.end_row();

                ui.label("Color:");
                ui.horizontal(|ui| {
                    if ui.color_edit_button_srgb(&mut self.color).changed() {
                        self.send(ParamEvent::Color(Some(Color::from(self.color))));
                    }

                    let hex = ui.add(egui::TextEdit::singleline(&mut self.hex_input).desired_width(80.0));
                    let submitted = hex.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                    if ui.button("Apply").clicked() || submitted {
                        self.send(ParamEvent::ColorHex(self.hex_input.clone()));
                    }
                });
                ui.end_row();

                ui.label("Style:");
                let mut mode = self.overlay.mode();
                egui::ComboBox::from_id_salt("mode_select")
                    .selected_text(mode.label())
                    .show_ui(ui, |ui| {
                        for candidate in CompositeMode::ALL {
                            ui.selectable_value(&mut mode, candidate, candidate.label());
                        }
                    });
                self.overlay.set_mode(mode);
                ui.end_row();
            });

        ui.add_space(20.0);
        ui.separator();
        ui.add_space(10.0);

        ui.label("Presets:");
        ui.horizontal(|ui| {
            for preset in Preset::ALL {
                if ui.button(preset.label()).on_hover_text(preset.tooltip()).clicked() {
                    self.send(ParamEvent::Preset(preset));
                }
            }

            ui.add_space(10.0);
            if ui
                .button("Reset")
                .on_hover_text(format!("Back to the {} defaults", self.profile.name()))
                .clicked()
            {
                self.send(ParamEvent::Reset(self.profile));
            }
        });

        ui.add_space(15.0);

        let mut dismiss = false;
        if let Some(msg) = &self.status_message {
            ui.horizontal(|ui| {
                ui.colored_label(egui::Color32::from_rgb(230, 180, 80), msg);
                dismiss = ui.small_button("x").clicked();
            });
        }
        if dismiss {
            self.dismiss_warning();
        }
    }

    fn dismiss_warning(&mut self) {
        self.status_message = None;
        self.store.clear_warning();
    }
}

impl eframe::App for ControlPanel {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.style_mut(|style| {
            style.interaction.selectable_labels = false;
        });

        let now = Instant::now();
        self.drain_commands(ctx);
        self.drain_events();
        self.poll_geometry(ctx, now);

        self.overlay.show(ctx, &self.store);

        self.title_bar(ctx);
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| self.controls(ui));
        });

        // widget events land in the channel; pick them up next frame
        if !self.event_rx.is_empty() || !self.command_rx.is_empty() {
            ctx.request_repaint();
        }
        ctx.request_repaint_after(self.tracker.time_until_next_poll(Instant::now()));
    }

    fn clear_color(&self, _visuals: &egui::Visuals) -> [f32; 4] {
        // the overlay viewport shares this; its unlit pixels must stay see-through
        [0.0, 0.0, 0.0, 0.0]
    }
}
