use planmark_annotator::{
    Annotation, AnnotationStore, AnnotationType, HistoryConfig, HistoryManager,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Push,
    Undo,
    Redo,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![3 => Just(Op::Push), 2 => Just(Op::Undo), 1 => Just(Op::Redo)]
}

/// Reference model: a label stack and a cursor.
#[derive(Default)]
struct Model {
    labels: Vec<String>,
    index: Option<usize>,
}

impl Model {
    fn push(&mut self, label: String, max: usize) {
        if let Some(index) = self.index {
            self.labels.truncate(index + 1);
        }
        self.labels.push(label);
        if self.labels.len() > max {
            self.labels.remove(0);
        }
        self.index = Some(self.labels.len() - 1);
    }

    fn undo(&mut self) {
        if let Some(index) = self.index.filter(|i| *i > 0) {
            self.index = Some(index - 1);
        }
    }

    fn redo(&mut self) {
        if let Some(index) = self.index.filter(|i| i + 1 < self.labels.len()) {
            self.index = Some(index + 1);
        }
    }
}

proptest! {
    #[test]
    fn proptest_history_matches_model(
        max_size in 1usize..8,
        ops in prop::collection::vec(op_strategy(), 0..60),
    ) {
        let mut history = HistoryManager::new(HistoryConfig { max_size });
        let mut store = AnnotationStore::new();
        let mut model = Model::default();

        for (step, op) in ops.iter().enumerate() {
            match op {
                Op::Push => {
                    store.add(Annotation::new(AnnotationType::Room, 1));
                    let label = format!("step {}", step);
                    history.push(store.as_slice(), label.clone());
                    model.push(label, max_size);
                }
                Op::Undo => {
                    history.undo(&mut store);
                    model.undo();
                }
                Op::Redo => {
                    history.redo(&mut store);
                    model.redo();
                }
            }

            prop_assert!(history.len() <= max_size);
            prop_assert_eq!(history.index(), model.index);
            let labels: Vec<&str> = history.snapshots().iter().map(|s| s.label.as_str()).collect();
            prop_assert_eq!(labels, model.labels.iter().map(String::as_str).collect::<Vec<_>>());
            if let Some(current) = history.current() {
                prop_assert_eq!(current.annotations.as_slice(), store.as_slice());
            }
        }
    }

    #[test]
    fn proptest_push_after_undo_drops_redo_branch(pushes in 2usize..10, undos in 1usize..10) {
        let undos = undos.min(pushes - 1);
        let mut history = HistoryManager::new(HistoryConfig { max_size: 50 });
        let mut store = AnnotationStore::new();

        for n in 0..pushes {
            store.add(Annotation::new(AnnotationType::Location, 1));
            history.push(store.as_slice(), format!("{}", n));
        }
        for _ in 0..undos {
            prop_assert!(history.undo(&mut store).is_some());
        }
        history.push(store.as_slice(), "branch");

        prop_assert_eq!(history.len(), pushes - undos + 1);
        prop_assert!(!history.can_redo());
        prop_assert_eq!(history.current().map(|s| s.label.as_str()), Some("branch"));
    }
}
