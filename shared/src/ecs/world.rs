//! The ECS container (§4.1): entities, components, system dispatch, query
//! access.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use log::warn;

use super::component::{downcast_mut, downcast_ref, Component};
use crate::error::EcsError;
use crate::events::EventBus;
use crate::rng::SeededRng;
use crate::types::{EntityId, Tick, LOCAL_ENTITY_BASE};

type ComponentMap = HashMap<&'static str, Box<dyn Component>>;

struct EntityRecord {
    components: ComponentMap,
}

/// A single-responsibility gameplay system, polymorphic over `update`.
/// Communication between systems happens only through components (§3):
/// "No system observes another's private state".
pub trait System: Send {
    fn name(&self) -> &'static str;
    fn update(&mut self, world: &mut World, dt: f64);
}

enum DeferredOp {
    Spawn(EntityId, ComponentMap),
    Destroy(EntityId),
}

/// The ECS container. Holds the live entity/component tables, the tick
/// counter, the world's root [`SeededRng`], and a lazily-rebuilt cached
/// entity list.
pub struct World {
    entities: HashMap<EntityId, EntityRecord>,
    next_id: EntityId,
    next_local_id: EntityId,
    tick: Tick,
    rng: SeededRng,
    systems: Vec<Box<dyn System>>,
    deferred: Vec<DeferredOp>,
    events: EventBus,

    // Cached read-only view over live entity ids (§4.1 "Public contract").
    // `dirty` is a Cell so `get_entities(&self)` can rebuild lazily without
    // requiring `&mut self` from every caller (systems only need read access
    // to iterate entities).
    cache: RefCell<Vec<EntityId>>,
    dirty: Cell<bool>,
}

impl World {
    pub fn new(world_seed: u64) -> Self {
        Self {
            entities: HashMap::new(),
            next_id: 1,
            next_local_id: LOCAL_ENTITY_BASE,
            tick: 0,
            rng: SeededRng::from_world_seed(world_seed),
            systems: Vec::new(),
            deferred: Vec::new(),
            events: EventBus::new(),
            cache: RefCell::new(Vec::new()),
            dirty: Cell::new(true),
        }
    }

    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn rng_mut(&mut self) -> &mut SeededRng {
        &mut self.rng
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    /// Drains gameplay events accumulated since the last call (§6: "the core
    /// emits; audio subscribes"). Called once per tick by the server/client
    /// binary after `update`.
    pub fn drain_events(&mut self) -> Vec<crate::events::GameEvent> {
        self.events.drain()
    }

    /// Registers a system; update order is fixed at this point (§4.1).
    pub fn register_system(&mut self, system: Box<dyn System>) {
        self.systems.push(system);
    }

    // -- Entity lifecycle ----------------------------------------------

    /// Assigns the next server-range id, inserts an empty component map, and
    /// marks the cache dirty.
    pub fn create_entity(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        self.entities.insert(
            id,
            EntityRecord {
                components: HashMap::new(),
            },
        );
        self.dirty.set(true);
        id
    }

    /// Assigns the next client-local id (particle emitters, UI helpers).
    /// Never sent over the wire; see [`crate::types::is_local_entity`].
    pub fn create_local_entity(&mut self) -> EntityId {
        let id = self.next_local_id;
        self.next_local_id += 1;
        self.entities.insert(
            id,
            EntityRecord {
                components: HashMap::new(),
            },
        );
        self.dirty.set(true);
        id
    }

    /// Removes and marks the cache dirty. No-op if `id` is absent (§4.1
    /// "fails silently if absent").
    pub fn remove_entity(&mut self, id: EntityId) {
        if self.entities.remove(&id).is_some() {
            self.dirty.set(true);
        }
    }

    pub fn contains_entity(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    // -- Components -------------------------------------------------------

    pub fn add_component<C: Component>(&mut self, id: EntityId, component: C) -> Result<(), EcsError> {
        let tag = component.type_tag();
        let record = self
            .entities
            .get_mut(&id)
            .ok_or(EcsError::UnknownEntity { entity: id })?;
        record.components.insert(tag, Box::new(component));
        Ok(())
    }

    pub fn remove_component(&mut self, id: EntityId, tag: &'static str) {
        if let Some(record) = self.entities.get_mut(&id) {
            record.components.remove(tag);
        }
    }

    pub fn get_component<C: Component + ComponentTag>(&self, id: EntityId) -> Option<&C> {
        let record = self.entities.get(&id)?;
        let boxed = record.components.get(C::type_tag_of())?;
        downcast_ref::<C>(boxed.as_ref())
    }

    pub fn get_component_mut<C: Component + ComponentTag>(&mut self, id: EntityId) -> Option<&mut C> {
        let record = self.entities.get_mut(&id)?;
        let boxed = record.components.get_mut(C::type_tag_of())?;
        downcast_mut::<C>(boxed.as_mut())
    }

    pub fn has_component(&self, id: EntityId, tag: &str) -> bool {
        self.entities
            .get(&id)
            .map(|r| r.components.contains_key(tag))
            .unwrap_or(false)
    }

    // -- Queries ------------------------------------------------------------

    /// Returns a cached, stable-order, read-only view of live entity ids
    /// (§4.1, §8 "GetEntities returns a stable-order view"). Rebuilt only
    /// when the cache is dirty.
    pub fn get_entities(&self) -> std::cell::Ref<'_, Vec<EntityId>> {
        if self.dirty.get() {
            let mut cache = self.cache.borrow_mut();
            cache.clear();
            cache.extend(self.entities.keys().copied());
            cache.sort_unstable();
            self.dirty.set(false);
        }
        self.cache.borrow()
    }

    // -- Deferred spawn/destroy (§4.1, §9) ---------------------------------

    /// Enqueues a destroy request; applied when the queue is flushed between
    /// system updates, never mid-iteration.
    pub fn queue_destroy(&mut self, id: EntityId) {
        self.deferred.push(DeferredOp::Destroy(id));
    }

    /// Reserves an id now (so callers may reference it immediately, e.g. for
    /// an Equipment slot pointing at a not-yet-visible item entity) and
    /// enqueues its component insertion for the next flush.
    pub fn queue_spawn(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        self.deferred.push(DeferredOp::Spawn(id, HashMap::new()));
        id
    }

    /// Attaches a component to a pending (not yet visible) spawn. No-op if
    /// `id` does not correspond to a pending spawn in this queue.
    pub fn queue_add_component<C: Component>(&mut self, id: EntityId, component: C) {
        for op in self.deferred.iter_mut() {
            if let DeferredOp::Spawn(spawn_id, components) = op {
                if *spawn_id == id {
                    components.insert(component.type_tag(), Box::new(component));
                    return;
                }
            }
        }
    }

    fn flush_deferred(&mut self) {
        if self.deferred.is_empty() {
            return;
        }
        let ops = std::mem::take(&mut self.deferred);
        for op in ops {
            match op {
                DeferredOp::Spawn(id, components) => {
                    self.entities.insert(id, EntityRecord { components });
                    self.dirty.set(true);
                }
                DeferredOp::Destroy(id) => {
                    if self.entities.remove(&id).is_some() {
                        self.dirty.set(true);
                    }
                }
            }
        }
    }

    // -- Tick update --------------------------------------------------------

    /// Runs each registered system in registration order; the deferred
    /// spawn/destroy queue is flushed between systems (§4.1).
    pub fn update(&mut self, dt: f64) {
        self.tick += 1;
        let mut systems = std::mem::take(&mut self.systems);
        for system in systems.iter_mut() {
            system.update(self, dt);
            self.flush_deferred();
        }
        self.systems = systems;
    }

    pub fn system_names(&self) -> Vec<&'static str> {
        self.systems.iter().map(|s| s.name()).collect()
    }
}

/// Extension so `get_component`/`get_component_mut` can look up the tag
/// without an instance. Blanket-implemented for every [`Component`] via
/// [`crate::impl_component`], which also defines the `TAG` const this relies
/// on indirectly through the trait object's `type_tag()` — kept as a
/// separate trait so generic code can call `C::type_tag_of()` without first
/// constructing a `C`.
pub trait ComponentTag {
    fn type_tag_of() -> &'static str;
}

/// Logs a structured consistency-violation event and returns, matching §7's
/// policy for missing-component handling in systems (early-return, continue
/// the tick).
pub fn log_missing_component(entity: EntityId, tag: &'static str) {
    warn!(
        "consistency-violation: entity {entity} missing expected component '{tag}'; skipping"
    );
}
