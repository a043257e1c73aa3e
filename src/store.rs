//store.rs
use crate::models::Workout;

/// Insertion-ordered collection of workouts for the current session.
/// Owned exclusively by the app controller; the map marker list is kept
/// index-aligned with this sequence.
#[derive(Debug, Default)]
pub struct WorkoutStore {
    workouts: Vec<Workout>,
}

impl WorkoutStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_workouts(workouts: Vec<Workout>) -> Self {
        Self { workouts }
    }

    pub fn add(&mut self, workout: Workout) {
        self.workouts.push(workout);
    }

    /// Insert at a fixed position, used by the edit flow to keep the
    /// replacement at the original spot in the list.
    pub fn insert_at(&mut self, index: usize, workout: Workout) {
        let index = index.min(self.workouts.len());
        self.workouts.insert(index, workout);
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Workout> {
        self.workouts.iter().find(|w| w.id == id)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.workouts.iter().position(|w| w.id == id)
    }

    /// Removes the workout with the given id, shifting the rest down.
    /// An absent id leaves the store untouched and returns `None`.
    pub fn remove_by_id(&mut self, id: &str) -> Option<Workout> {
        let index = self.index_of(id)?;
        Some(self.workouts.remove(index))
    }

    pub fn all(&self) -> &[Workout] {
        &self.workouts
    }

    pub fn len(&self) -> usize {
        self.workouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workouts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running(distance: f64) -> Workout {
        Workout::running([10.0, 20.0], distance, 25.0, 178.0).unwrap()
    }

    #[test]
    fn added_workouts_are_found_by_id() {
        let mut store = WorkoutStore::new();
        let workout = running(5.0);
        let id = workout.id.clone();

        store.add(workout.clone());
        assert_eq!(store.find_by_id(&id), Some(&workout));
        assert_eq!(store.index_of(&id), Some(0));
    }

    #[test]
    fn removal_forgets_the_workout() {
        let mut store = WorkoutStore::new();
        let workout = running(5.0);
        let id = workout.id.clone();

        store.add(workout);
        assert!(store.remove_by_id(&id).is_some());
        assert_eq!(store.find_by_id(&id), None);
        assert!(store.is_empty());
    }

    #[test]
    fn removing_an_unknown_id_is_a_noop() {
        let mut store = WorkoutStore::new();
        store.add(running(5.0));

        assert!(store.remove_by_id("no-such-id").is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn removal_shifts_later_entries_down() {
        let mut store = WorkoutStore::new();
        let first = running(1.0);
        let second = running(2.0);
        let third = running(3.0);
        let second_id = second.id.clone();
        let third_id = third.id.clone();

        store.add(first);
        store.add(second);
        store.add(third);
        store.remove_by_id(&second_id);

        assert_eq!(store.len(), 2);
        assert_eq!(store.index_of(&third_id), Some(1));
    }

    #[test]
    fn insert_at_keeps_the_requested_position() {
        let mut store = WorkoutStore::new();
        let first = running(1.0);
        let second = running(2.0);
        let replacement = running(9.0);
        let replacement_id = replacement.id.clone();

        store.add(first);
        store.add(second);
        store.insert_at(1, replacement);

        assert_eq!(store.index_of(&replacement_id), Some(1));
        assert_eq!(store.len(), 3);
    }
}
