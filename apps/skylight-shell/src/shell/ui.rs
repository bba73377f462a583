use super::*;

impl ShellApp {
    fn observe_lifecycle(&mut self, ctx: &egui::Context) {
        if !self.first_appearance_done {
            self.first_appearance_done = true;
            self.ensure_primary_loaded("first appearance");
        }

        let focused = ctx.input(|input| input.focused);
        self.handle_focus_change(focused);
    }

    fn render_primary_surface(&mut self, ui: &mut egui::Ui) {
        ui.heading("Hosted Page");
        ui.label(format!("Start URL: {}", self.config.start_url));
        ui.separator();

        let primary = self.primary_surface_id();
        if let Some(error) = self.surface_errors.get(&primary) {
            ui.colored_label(
                egui::Color32::from_rgb(200, 65, 65),
                format!("Error: {error}"),
            );
            if let Some(pending) = &self.pending_retry {
                let remaining = pending.due_at.saturating_duration_since(Instant::now());
                ui.label(format!(
                    "Retry {} in {:.1}s",
                    pending.ticket.attempt,
                    remaining.as_secs_f32()
                ));
            }
            ui.separator();
        }

        match self.previews.get(&primary) {
            Some(preview) => {
                render_page_preview(ui, preview, "primary_preview_scroll");
            }
            None => {
                if self.primary_loading() {
                    ui.spinner();
                    ui.label("Loading...");
                } else {
                    ui.label("No page loaded yet.");
                }
            }
        }
    }

    fn render_external_surfaces(&mut self, ctx: &egui::Context) {
        let surfaces: Vec<(u64, String)> = self
            .stack
            .chain()
            .iter()
            .skip(1)
            .map(|surface| (surface.id, surface.url.clone()))
            .collect();

        let mut dismiss_requested = false;
        let count = surfaces.len();
        for (index, (surface_id, url)) in surfaces.iter().enumerate() {
            let is_topmost = index + 1 == count;
            egui::Window::new("In-App Browser")
                .id(egui::Id::new(("external_surface", *surface_id)))
                .collapsible(false)
                .resizable(true)
                .default_size([760.0, 560.0])
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        ui.label(url.as_str());
                        // Only the topmost surface takes input, matching a
                        // full-screen modal presentation.
                        if is_topmost && ui.button("Done").clicked() {
                            dismiss_requested = true;
                        }
                    });
                    ui.separator();

                    if let Some(error) = self.surface_errors.get(surface_id) {
                        ui.colored_label(
                            egui::Color32::from_rgb(200, 65, 65),
                            format!("Error: {error}"),
                        );
                    } else {
                        match self.previews.get(surface_id) {
                            Some(preview) => render_page_preview(
                                ui,
                                preview,
                                ("external_preview_scroll", *surface_id),
                            ),
                            None => {
                                ui.spinner();
                                ui.label("Loading...");
                            }
                        }
                    }
                });
        }

        if dismiss_requested {
            self.dismiss_topmost_surface();
        }
    }

    fn render_details(&mut self, ui: &mut egui::Ui) {
        ui.heading("Bridge Console");
        ui.label(format!("Channel: {BRIDGE_CHANNEL_NAME}"));
        ui.horizontal(|ui| {
            let response = ui.add_sized(
                [ui.available_width() - 70.0, 24.0],
                egui::TextEdit::singleline(&mut self.console_input)
                    .hint_text(r#"{"action": "log", "data": "hello"}"#),
            );
            let pressed_enter =
                response.lost_focus() && ui.input(|input| input.key_pressed(egui::Key::Enter));
            if pressed_enter || ui.button("Post").clicked() {
                self.post_console_message();
            }
        });
        ui.separator();

        ui.label(format!(
            "Surfaces: {} (topmost {})",
            self.stack.depth(),
            topmost(&self.stack).kind.as_str()
        ));
        ui.label(format!(
            "Primary phase: {}",
            self.primary_phase.as_str()
        ));
        ui.label(format!(
            "Retry attempts: {} (epoch {})",
            self.retry_state.attempts(),
            self.retry_state.epoch()
        ));
        ui.separator();

        ui.label("Bridge Events");
        egui::ScrollArea::vertical()
            .id_salt("bridge_event_scroll")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for entry in self.bridge_log.iter().rev() {
                    ui.label(entry);
                }
            });
    }
}

fn render_page_preview(ui: &mut egui::Ui, preview: &PagePreview, scroll_id: impl std::hash::Hash) {
    if let Some(title) = &preview.title {
        ui.label(format!("Title: {title}"));
    }
    ui.label(format!(
        "{} (status {}, {} bytes)",
        preview.final_url, preview.status_code, preview.body_bytes
    ));
    ui.separator();

    egui::ScrollArea::vertical()
        .id_salt(scroll_id)
        .auto_shrink([false, false])
        .show(ui, |ui| {
            ui.label(
                egui::RichText::new(preview.body_preview.as_str())
                    .monospace()
                    .size(12.0),
            );
        });
}

impl eframe::App for ShellApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.observe_lifecycle(ctx);
        self.poll_loads();
        self.poll_bridge();
        self.apply_pending_commands();
        self.poll_retry();

        if ctx.input(|input| input.key_pressed(egui::Key::F12)) {
            self.show_details = !self.show_details;
        }

        if self.primary_loading() || !self.inflight.is_empty() || self.pending_retry.is_some() {
            ctx.request_repaint_after(LOADING_REPAINT_INTERVAL);
        }

        egui::TopBottomPanel::top("toolbar_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Reload").clicked() {
                    self.reload_primary(ReloadDirective::plain(), "manual reload");
                }

                ui.separator();
                ui.label(format!("Current: {}", self.config.start_url));

                if self.primary_loading() {
                    ui.separator();
                    ui.spinner();
                    ui.label("Loading");
                }

                ui.separator();
                ui.label("F12: Bridge Details");
            });
        });

        egui::TopBottomPanel::bottom("status_panel").show(ctx, |ui| {
            ui.horizontal_wrapped(|ui| {
                ui.label(&self.status_line);
                if let Some(error) = &self.last_error {
                    ui.colored_label(
                        egui::Color32::from_rgb(200, 65, 65),
                        format!("Error: {error}"),
                    );
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_primary_surface(ui);
        });

        self.render_external_surfaces(ctx);

        if self.show_details {
            egui::Window::new("Bridge Details")
                .id(egui::Id::new("bridge_details_window"))
                .resizable(true)
                .default_size([520.0, 440.0])
                .show(ctx, |ui| {
                    self.render_details(ui);
                });
        }
    }
}
