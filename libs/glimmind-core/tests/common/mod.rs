//! Shared fixtures for glimmind-core integration tests.
//!
//! Provides list builders and a recording observer that keeps every list
//! the engine emits, standing in for the list store.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use glimmind_core::{Association, AssociationList, CycleEngine, Status};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Lists emitted by an engine, oldest first.
#[derive(Clone, Default)]
pub struct Recorder {
    emitted: Rc<RefCell<Vec<AssociationList>>>,
}

impl Recorder {
    pub fn observer(&self) -> impl FnMut(&AssociationList) + 'static {
        let sink = self.emitted.clone();
        move |list: &AssociationList| sink.borrow_mut().push(list.clone())
    }

    pub fn last(&self) -> AssociationList {
        self.emitted
            .borrow()
            .last()
            .cloned()
            .expect("engine emitted nothing")
    }

    pub fn count(&self) -> usize {
        self.emitted.borrow().len()
    }

    pub fn all(&self) -> Vec<AssociationList> {
        self.emitted.borrow().clone()
    }
}

/// A list of `n` associations all at `status`.
pub fn list_of(n: usize, status: Status) -> AssociationList {
    let associations = (0..n)
        .map(|i| {
            let mut assoc = Association::new(format!("term {i}"), format!("definition {i}"));
            assoc.status = status;
            assoc
        })
        .collect();
    AssociationList::new("test-owner", "Fixture", "Term / Definition", associations)
}

/// A list holding the given term/definition pairs, all unknown.
pub fn list_from_pairs(pairs: &[(&str, &str)]) -> AssociationList {
    let associations = pairs
        .iter()
        .map(|(term, definition)| Association::new(*term, *definition))
        .collect();
    AssociationList::new("test-owner", "Fixture", "Spanish / English", associations)
}

/// Engine with a fixed shuffle seed, recording its emissions.
pub fn engine_for(list: AssociationList, seed: u64) -> (CycleEngine, Recorder) {
    let recorder = Recorder::default();
    let engine = CycleEngine::with_rng(list, recorder.observer(), StdRng::seed_from_u64(seed));
    (engine, recorder)
}
