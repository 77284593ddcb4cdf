//! Download, materialize and load the Brain Invaders P300 EEG datasets.
//!
//! A [`dataset::Dataset`] ties a dataset variant, a run [`domain::Selection`]
//! and an explicit archive cache ([`store::Store`]) together. Asking it for a
//! subject fetches the subject's archives once, extracts them once into
//! `subject_<NN>/Session<K>/`, filters the runs listed in `meta.yml` and loads
//! the matching `.mat` files as [`recording::Recording`]s grouped by session
//! and run.

pub mod app;
pub mod config;
pub mod dataset;
pub mod domain;
pub mod error;
pub mod events;
pub mod fetch;
pub mod fs_util;
pub mod manifest;
pub mod materialize;
pub mod output;
pub mod recording;
pub mod resolve;
pub mod store;
