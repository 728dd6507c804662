//! sf-engine: the automation contract of the process simulation engine.
//!
//! Provides:
//! - `EngineSession` / `Flowsheet` traits mirroring the engine's automation API
//! - Typed object kinds, properties and reaction definitions
//! - A compound catalog and the list of known property packages
//! - The `loopback` backend, an in-process material-balance stand-in
//! - `testing::RecordingEngine` for call accounting and fault injection
//!
//! # Architecture
//!
//! Everything the sweep does to the engine goes through the two traits in
//! [`session`]. Every call can fail with an engine-specific message; the
//! sweep layer turns those failures into data.
//!
//! # Units
//!
//! Values crossing the engine boundary are SI: K, Pa, mol/s, kg/s, W, m³.
//!
//! # Example
//!
//! ```
//! use sf_engine::{EngineSettings, ObjectKind, Property, PropertyValue, open_session};
//!
//! let mut session = open_session(&EngineSettings::default()).unwrap();
//! let mut sheet = session.open_flowsheet().unwrap();
//! sheet.add_compound("Ethane").unwrap();
//! sheet.set_property_package("Peng-Robinson (PR)").unwrap();
//! let feed = sheet.add_object(ObjectKind::MaterialStream, "Feed").unwrap();
//! sheet.set_property(&feed, Property::Temperature, PropertyValue::Real(300.0)).unwrap();
//! sheet.close().unwrap();
//! ```

pub mod catalog;
pub mod error;
pub mod loopback;
pub mod session;
pub mod testing;

pub use catalog::{CompoundData, PROPERTY_PACKAGES, compound_catalog, find_compound, is_known_property_package};
pub use error::{EngineError, EngineResult};
pub use loopback::{LoopbackEngine, LoopbackFlowsheet};
pub use session::{
    BackendKind, CondenserKind, EngineSession, EngineSettings, Flowsheet, ObjectKind, ObjectRef,
    Property, PropertyValue, ReactionRef, ReactionSpec, ReactorMode, ReboilerKind, open_session,
};
