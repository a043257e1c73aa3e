//app.rs
use eframe::egui::{
    self, Align, Align2, Color32, Key, Label, Layout, RichText, ScrollArea, Sense, Ui,
};

use crate::geolocation;
use crate::map::{MapPanel, MarkerId, INITIAL_ZOOM};
use crate::models::{Coords, ValidationError, Workout, WorkoutDetails, WorkoutType};
use crate::storage::{load_workouts, save_workouts, KeyValueStore, STORAGE_KEY};
use crate::store::WorkoutStore;

/// Form visibility state machine: `Hidden` until a map click captures
/// coordinates; `Edit` additionally remembers which workout the
/// submission will replace.
#[derive(Debug, Clone, PartialEq)]
enum FormState {
    Hidden,
    New { coords: Coords },
    Edit { id: String, coords: Coords },
}

#[derive(Default)]
struct FormFields {
    kind: WorkoutType,
    distance: String,
    duration: String,
    cadence: String,
    elevation: String,
}

impl FormFields {
    fn clear(&mut self) {
        self.distance.clear();
        self.duration.clear();
        self.cadence.clear();
        self.elevation.clear();
    }
}

enum ListAction {
    Select(String),
    Edit(String),
    Delete(String),
}

pub struct WorkoutMapApp {
    storage: Box<dyn KeyValueStore>,
    store: WorkoutStore,
    map: Option<MapPanel>,
    /// One handle per workout, index-aligned with the store. Stays empty
    /// when the map never initialized.
    markers: Vec<MarkerId>,
    form: FormState,
    fields: FormFields,
    alert: Option<String>,
    focus_distance: bool,
}

impl WorkoutMapApp {
    pub fn new(storage: Box<dyn KeyValueStore>) -> Self {
        let position = geolocation::current_position();
        Self::with_position(storage, position)
    }

    /// Builds the app around an already-resolved start position. `None`
    /// leaves the map uninitialized and raises the alert the original
    /// geolocation failure would.
    pub fn with_position(storage: Box<dyn KeyValueStore>, position: Option<Coords>) -> Self {
        let store = WorkoutStore::from_workouts(load_workouts(&*storage));

        let mut map = position.map(|coords| MapPanel::new(coords, INITIAL_ZOOM));
        let mut markers = Vec::new();
        if let Some(map) = map.as_mut() {
            for workout in store.all() {
                markers.push(place_marker(map, workout));
            }
        }

        let alert = position
            .is_none()
            .then(|| "Can't get your current position!".to_string());

        Self {
            storage,
            store,
            map,
            markers,
            form: FormState::Hidden,
            fields: FormFields::default(),
            alert,
            focus_distance: false,
        }
    }

    /// Valid submit: create the workout, append it (or re-insert it at
    /// the edited workout's position), drop a marker, persist, hide the
    /// form. Invalid submit: alert, hide the form, mutate nothing.
    fn submit_form(&mut self) {
        let state = std::mem::replace(&mut self.form, FormState::Hidden);
        let (coords, edit_target) = match state {
            FormState::Hidden => return,
            FormState::New { coords } => (coords, None),
            FormState::Edit { id, coords } => (coords, Some(id)),
        };

        let workout = match self.build_workout(coords) {
            Ok(workout) => workout,
            Err(e) => {
                self.alert = Some(e.to_string());
                self.fields.clear();
                return;
            }
        };

        match edit_target.and_then(|id| self.store.index_of(&id).map(|index| (id, index))) {
            Some((id, index)) => {
                self.store.remove_by_id(&id);
                if let Some(map) = self.map.as_mut() {
                    map.remove_marker(self.markers.remove(index));
                }
                self.store.insert_at(index, workout.clone());
                if let Some(map) = self.map.as_mut() {
                    self.markers.insert(index, place_marker(map, &workout));
                }
            }
            None => {
                self.store.add(workout.clone());
                if let Some(map) = self.map.as_mut() {
                    self.markers.push(place_marker(map, &workout));
                }
            }
        }

        save_workouts(self.storage.as_mut(), self.store.all());
        self.fields.clear();
    }

    fn build_workout(&self, coords: Coords) -> Result<Workout, ValidationError> {
        let distance = numeric("Distance", &self.fields.distance)?;
        let duration = numeric("Duration", &self.fields.duration)?;
        match self.fields.kind {
            WorkoutType::Running => {
                let cadence = numeric("Cadence", &self.fields.cadence)?;
                Workout::running(coords, distance, duration, cadence)
            }
            WorkoutType::Cycling => {
                let elevation = numeric("Elevation", &self.fields.elevation)?;
                Workout::cycling(coords, distance, duration, elevation)
            }
        }
    }

    /// Pre-fills the form from an existing workout and switches to edit
    /// mode. Unknown ids are ignored.
    fn begin_edit(&mut self, id: &str) {
        let Some(workout) = self.store.find_by_id(id) else {
            return;
        };

        self.fields.kind = workout.kind();
        self.fields.distance = fmt_num(workout.distance_km);
        self.fields.duration = fmt_num(workout.duration_min);
        match workout.details {
            WorkoutDetails::Running {
                cadence_steps_per_min,
                ..
            } => self.fields.cadence = fmt_num(cadence_steps_per_min),
            WorkoutDetails::Cycling {
                elevation_gain_m, ..
            } => self.fields.elevation = fmt_num(elevation_gain_m),
        }

        self.form = FormState::Edit {
            id: id.to_string(),
            coords: workout.coordinates,
        };
        self.focus_distance = true;
    }

    /// Removes the workout and its marker, then re-persists. Unknown ids
    /// leave everything untouched.
    fn delete_workout(&mut self, id: &str) {
        let Some(index) = self.store.index_of(id) else {
            return;
        };

        self.store.remove_by_id(id);
        if let Some(map) = self.map.as_mut() {
            map.remove_marker(self.markers.remove(index));
        }
        save_workouts(self.storage.as_mut(), self.store.all());

        // The form may have been pointing at the deleted workout.
        if matches!(&self.form, FormState::Edit { id: target, .. } if target == id) {
            self.hide_form();
        }
    }

    fn move_to_workout(&mut self, id: &str) {
        if let (Some(map), Some(workout)) = (self.map.as_mut(), self.store.find_by_id(id)) {
            map.set_view(workout.coordinates, INITIAL_ZOOM);
        }
    }

    fn hide_form(&mut self) {
        self.form = FormState::Hidden;
        self.fields.clear();
    }

    /// Drops every workout, marker and the persisted record.
    fn reset(&mut self) {
        self.store = WorkoutStore::new();
        if let Some(map) = self.map.as_mut() {
            for marker in self.markers.drain(..) {
                map.remove_marker(marker);
            }
        }
        self.markers.clear();
        self.storage.remove_item(STORAGE_KEY);
        self.hide_form();
    }

    fn map_clicked(&mut self, coords: Coords) {
        // A click while editing just recaptures the coordinates.
        self.form = match std::mem::replace(&mut self.form, FormState::Hidden) {
            FormState::Edit { id, .. } => FormState::Edit { id, coords },
            _ => FormState::New { coords },
        };
        self.focus_distance = true;
    }
}

impl eframe::App for WorkoutMapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if ctx.input(|i| i.key_pressed(Key::Escape)) && self.form != FormState::Hidden {
            self.hide_form();
        }

        if let Some(message) = self.alert.clone() {
            egui::Window::new("Heads up")
                .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label(message);
                    ui.add_space(6.0);
                    if ui.button("OK").clicked() {
                        self.alert = None;
                    }
                });
        }

        egui::SidePanel::left("workout_list")
            .default_width(340.0)
            .show(ctx, |ui| {
                ui.add_space(8.0);
                ui.label(RichText::new("Workout Map").heading().strong());
                ui.add_space(8.0);

                if self.form == FormState::Hidden {
                    ui.label(RichText::new("Click the map to record a workout.").weak());
                } else {
                    self.show_form(ui);
                }

                ui.add_space(8.0);
                ui.separator();

                let mut action = None;
                ScrollArea::vertical().show(ui, |ui| {
                    // Newest first.
                    for workout in self.store.all().iter().rev() {
                        if let Some(a) = show_workout_entry(ui, workout) {
                            action = Some(a);
                        }
                        ui.add_space(6.0);
                    }
                });

                match action {
                    Some(ListAction::Select(id)) => self.move_to_workout(&id),
                    Some(ListAction::Edit(id)) => self.begin_edit(&id),
                    Some(ListAction::Delete(id)) => self.delete_workout(&id),
                    None => {}
                }

                if !self.store.is_empty() {
                    ui.separator();
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(format!("{} workouts", self.store.len())).weak());
                        if ui.button("Clear all").clicked() {
                            self.reset();
                        }
                    });
                }
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            let clicked = match self.map.as_mut() {
                Some(map) => map.show(ui),
                None => {
                    ui.centered_and_justified(|ui| {
                        ui.label(
                            RichText::new("The map is unavailable without your position.")
                                .size(20.0)
                                .weak(),
                        );
                    });
                    None
                }
            };
            if let Some(coords) = clicked {
                self.map_clicked(coords);
            }
        });
    }
}

impl WorkoutMapApp {
    fn show_form(&mut self, ui: &mut Ui) {
        let title = match &self.form {
            FormState::Edit { .. } => "Edit workout",
            _ => "New workout",
        };

        let mut submitted = false;
        ui.group(|ui| {
            ui.label(RichText::new(title).strong());
            ui.add_space(4.0);

            ui.horizontal(|ui| {
                ui.label("Type");
                egui::ComboBox::from_id_salt("workout_type")
                    .selected_text(self.fields.kind.label())
                    .show_ui(ui, |ui| {
                        ui.selectable_value(&mut self.fields.kind, WorkoutType::Running, "Running");
                        ui.selectable_value(&mut self.fields.kind, WorkoutType::Cycling, "Cycling");
                    });
            });

            ui.horizontal(|ui| {
                ui.label("Distance");
                let distance = ui.add(
                    egui::TextEdit::singleline(&mut self.fields.distance)
                        .desired_width(60.0)
                        .hint_text("km"),
                );
                if self.focus_distance {
                    distance.request_focus();
                    self.focus_distance = false;
                }

                ui.label("Duration");
                ui.add(
                    egui::TextEdit::singleline(&mut self.fields.duration)
                        .desired_width(60.0)
                        .hint_text("min"),
                );
            });

            // Which third field is visible depends purely on the type.
            ui.horizontal(|ui| match self.fields.kind {
                WorkoutType::Running => {
                    ui.label("Cadence");
                    ui.add(
                        egui::TextEdit::singleline(&mut self.fields.cadence)
                            .desired_width(60.0)
                            .hint_text("step/min"),
                    );
                }
                WorkoutType::Cycling => {
                    ui.label("Elev. gain");
                    ui.add(
                        egui::TextEdit::singleline(&mut self.fields.elevation)
                            .desired_width(60.0)
                            .hint_text("m"),
                    );
                }
            });

            ui.add_space(4.0);
            ui.horizontal(|ui| {
                if ui.button("OK").clicked() {
                    submitted = true;
                }
                if ui.button("Cancel").clicked() {
                    self.hide_form();
                }
            });
        });

        if submitted || ui.input(|i| i.key_pressed(Key::Enter)) {
            self.submit_form();
        }
    }
}

fn show_workout_entry(ui: &mut Ui, workout: &Workout) -> Option<ListAction> {
    let mut action = None;

    ui.group(|ui| {
        ui.horizontal(|ui| {
            let title = ui.add(
                Label::new(RichText::new(&workout.description).strong().size(16.0))
                    .sense(Sense::click()),
            );
            if title.on_hover_text("Show on the map").clicked() {
                action = Some(ListAction::Select(workout.id.clone()));
            }

            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                ui.menu_button("⋯", |ui| {
                    if ui.button("Edit").clicked() {
                        action = Some(ListAction::Edit(workout.id.clone()));
                        ui.close_menu();
                    }
                    if ui.button("Delete").clicked() {
                        action = Some(ListAction::Delete(workout.id.clone()));
                        ui.close_menu();
                    }
                });
            });
        });

        ui.horizontal(|ui| {
            ui.label(format!(
                "{} {} km",
                workout.emoji(),
                fmt_num(workout.distance_km)
            ));
            ui.label(format!("⏱ {} min", fmt_num(workout.duration_min)));
            match workout.details {
                WorkoutDetails::Running {
                    cadence_steps_per_min,
                    pace_min_per_km,
                } => {
                    ui.label(format!("⚡ {:.1} min/km", pace_min_per_km));
                    ui.label(format!("🦶 {} spm", fmt_num(cadence_steps_per_min)));
                }
                WorkoutDetails::Cycling {
                    elevation_gain_m,
                    speed_km_per_h,
                } => {
                    ui.label(format!("⚡ {:.1} km/h", speed_km_per_h));
                    ui.label(format!("⛰ {} m", fmt_num(elevation_gain_m)));
                }
            }
        });
    });

    action
}

fn place_marker(map: &mut MapPanel, workout: &Workout) -> MarkerId {
    let popup = format!("{} {}", workout.emoji(), workout.description);
    map.add_marker(workout.coordinates, popup, accent(workout.kind()))
}

fn accent(kind: WorkoutType) -> Color32 {
    match kind {
        WorkoutType::Running => Color32::from_rgb(0, 196, 106),
        WorkoutType::Cycling => Color32::from_rgb(255, 181, 69),
    }
}

fn numeric(name: &'static str, raw: &str) -> Result<f64, ValidationError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| ValidationError::NotANumber(name))
}

fn fmt_num(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.1}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn app_with_map() -> WorkoutMapApp {
        WorkoutMapApp::with_position(Box::<MemoryStore>::default(), Some([10.0, 20.0]))
    }

    fn fill_running(app: &mut WorkoutMapApp, distance: &str) {
        app.fields.kind = WorkoutType::Running;
        app.fields.distance = distance.to_string();
        app.fields.duration = "25".to_string();
        app.fields.cadence = "178".to_string();
    }

    #[test]
    fn valid_submission_creates_and_persists() {
        let mut app = app_with_map();
        app.map_clicked([10.0, 20.0]);
        fill_running(&mut app, "5");
        app.submit_form();

        assert_eq!(app.store.len(), 1);
        assert_eq!(app.markers.len(), 1);
        assert_eq!(app.form, FormState::Hidden);
        assert!(app.alert.is_none());

        let saved = load_workouts(&*app.storage);
        assert_eq!(saved, app.store.all());
    }

    #[test]
    fn negative_distance_is_rejected_without_mutation() {
        let mut app = app_with_map();
        app.map_clicked([10.0, 20.0]);
        fill_running(&mut app, "-1");
        app.submit_form();

        assert!(app.store.is_empty());
        assert!(app.markers.is_empty());
        assert_eq!(app.form, FormState::Hidden);
        assert!(app.alert.is_some());
        assert!(load_workouts(&*app.storage).is_empty());
    }

    #[test]
    fn non_numeric_input_is_rejected() {
        let mut app = app_with_map();
        app.map_clicked([10.0, 20.0]);
        fill_running(&mut app, "five");
        app.submit_form();

        assert!(app.store.is_empty());
        assert_eq!(
            app.alert.as_deref(),
            Some("Distance has to be a number!")
        );
    }

    #[test]
    fn delete_removes_workout_marker_and_persisted_copy() {
        let mut app = app_with_map();
        app.map_clicked([10.0, 20.0]);
        fill_running(&mut app, "5");
        app.submit_form();
        let id = app.store.all()[0].id.clone();

        app.delete_workout(&id);

        assert!(app.store.is_empty());
        assert!(app.markers.is_empty());
        assert!(load_workouts(&*app.storage).is_empty());
    }

    #[test]
    fn deleting_an_unknown_id_changes_nothing() {
        let mut app = app_with_map();
        app.map_clicked([10.0, 20.0]);
        fill_running(&mut app, "5");
        app.submit_form();

        app.delete_workout("no-such-id");

        assert_eq!(app.store.len(), 1);
        assert_eq!(app.markers.len(), 1);
    }

    #[test]
    fn editing_replaces_in_place() {
        let mut app = app_with_map();
        app.map_clicked([10.0, 20.0]);
        fill_running(&mut app, "5");
        app.submit_form();
        app.map_clicked([11.0, 21.0]);
        fill_running(&mut app, "8");
        app.submit_form();

        let first_id = app.store.all()[0].id.clone();
        let second_id = app.store.all()[1].id.clone();

        app.begin_edit(&first_id);
        assert_eq!(app.fields.distance, "5");
        assert!(matches!(&app.form, FormState::Edit { id, .. } if *id == first_id));

        app.fields.distance = "7".to_string();
        app.submit_form();

        // Same position, new record, second workout untouched.
        assert_eq!(app.store.len(), 2);
        assert_eq!(app.store.all()[0].distance_km, 7.0);
        assert_ne!(app.store.all()[0].id, first_id);
        assert_eq!(app.store.all()[1].id, second_id);
        assert_eq!(app.markers.len(), 2);
    }

    #[test]
    fn saved_workouts_are_reloaded_with_markers() {
        let mut storage = Box::<MemoryStore>::default();
        let workouts = vec![
            Workout::running([10.0, 20.0], 5.0, 25.0, 178.0).unwrap(),
            Workout::cycling([10.5, 20.5], 20.0, 60.0, 200.0).unwrap(),
        ];
        save_workouts(storage.as_mut(), &workouts);

        let app = WorkoutMapApp::with_position(storage, Some([10.0, 20.0]));
        assert_eq!(app.store.all(), workouts);
        assert_eq!(app.markers.len(), 2);
    }

    #[test]
    fn missing_position_leaves_map_unset_and_alerts() {
        let app = WorkoutMapApp::with_position(Box::<MemoryStore>::default(), None);
        assert!(app.map.is_none());
        assert!(app.alert.is_some());
        assert!(app.markers.is_empty());
    }

    #[test]
    fn escape_equivalent_hides_and_clears_the_form() {
        let mut app = app_with_map();
        app.map_clicked([10.0, 20.0]);
        fill_running(&mut app, "5");
        app.hide_form();

        assert_eq!(app.form, FormState::Hidden);
        assert!(app.fields.distance.is_empty());
        assert!(app.store.is_empty());
    }

    #[test]
    fn reset_clears_store_markers_and_storage() {
        let mut app = app_with_map();
        app.map_clicked([10.0, 20.0]);
        fill_running(&mut app, "5");
        app.submit_form();

        app.reset();

        assert!(app.store.is_empty());
        assert!(app.markers.is_empty());
        assert!(load_workouts(&*app.storage).is_empty());
    }
}
