/*!
 * Caption annotation engine.
 *
 * - `units`: annotated units and how they are rendered
 * - `locator`: finding caption nodes on the surface
 * - `pipeline`: claiming and rewriting caption nodes
 * - `watcher`: triggering passes on structural changes
 * - `sync`: propagating a word's state to every visible occurrence
 */

pub mod locator;
pub mod pipeline;
pub mod sync;
pub mod units;
pub mod watcher;

pub use self::locator::CaptionLocator;
pub use self::pipeline::{AnnotationPipeline, PassReport};
pub use self::sync::WordStateSynchronizer;
pub use self::units::{AnnotatedUnit, InteractiveUnit, KnownState, UnitHandle};
pub use self::watcher::{MutationWatcher, ObservationGate, SuspendGuard, WatchState, WatcherHandle};
