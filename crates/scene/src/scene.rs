use crate::command::{CommandOutput, ObjectInfo, SceneCommand};
use crate::gpu::GpuResources;
use crate::model::Model;
use glam::Vec3;
use lumen_common::ModelId;

/// Errors from scene operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    #[error("object not found: {0}")]
    NotFound(ModelId),
    #[error("duplicate object id: {0}")]
    DuplicateId(ModelId),
}

/// The ordered collection of placed models.
///
/// Owned by the render thread. Draw order is the collection order, which
/// `sort_back_to_front` rewrites every frame. Lookups go by id, never by
/// position, because positions change with every sort.
#[derive(Debug, Default)]
pub struct Scene {
    models: Vec<Model>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Models in current draw order.
    pub fn models(&self) -> &[Model] {
        &self.models
    }

    /// Add a model. Each id may appear only once.
    pub fn insert(&mut self, model: Model) -> Result<(), SceneError> {
        if self.get(model.id()).is_some() {
            return Err(SceneError::DuplicateId(model.id()));
        }
        tracing::debug!(id = %model.id(), name = model.name(), "model added");
        self.models.push(model);
        Ok(())
    }

    pub fn get(&self, id: ModelId) -> Option<&Model> {
        self.models.iter().find(|m| m.id() == id)
    }

    pub fn get_mut(&mut self, id: ModelId) -> Option<&mut Model> {
        self.models.iter_mut().find(|m| m.id() == id)
    }

    /// Order models farthest-first from `eye` by squared distance.
    ///
    /// The sort is stable: models at equal distance keep their relative order.
    /// A NaN distance counts as infinitely far, so it cannot disturb the
    /// order of the finite ones.
    pub fn sort_back_to_front(&mut self, eye: Vec3) {
        let distance = |m: &Model| {
            let d = m.position().distance_squared(eye);
            if d.is_nan() { f32::INFINITY } else { d }
        };
        self.models.sort_by(|a, b| distance(b).total_cmp(&distance(a)));
    }

    /// Snapshot of every model, in id order.
    pub fn objects(&self) -> Vec<ObjectInfo> {
        let mut objects: Vec<ObjectInfo> = self
            .models
            .iter()
            .map(|m| ObjectInfo {
                id: m.id(),
                name: m.name().to_string(),
                transform: m.transform(),
            })
            .collect();
        objects.sort_by_key(|o| o.id);
        objects
    }

    /// Apply one command. Unknown ids are reported, not ignored.
    pub fn apply(&mut self, command: SceneCommand) -> Result<CommandOutput, SceneError> {
        match command {
            SceneCommand::GetObjects => Ok(CommandOutput::Objects(self.objects())),
            SceneCommand::Move { id, position } => self.edit(id, |m| m.set_position(position)),
            SceneCommand::Rotate { id, rotation } => self.edit(id, |m| m.set_rotation(rotation)),
            SceneCommand::Scale { id, scale } => self.edit(id, |m| m.set_scale(scale)),
            SceneCommand::Update { id, transform } => {
                self.edit(id, |m| m.set_transform(transform))
            }
        }
    }

    fn edit(
        &mut self,
        id: ModelId,
        f: impl FnOnce(&mut Model),
    ) -> Result<CommandOutput, SceneError> {
        let model = self.get_mut(id).ok_or(SceneError::NotFound(id))?;
        f(model);
        tracing::trace!(%id, "command applied");
        Ok(CommandOutput::Applied)
    }

    /// Remove every model and free its GPU buffers.
    pub fn clear(&mut self, gpu: &mut dyn GpuResources) {
        for model in self.models.drain(..) {
            model.release(gpu);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::test_support::{CountingGpu, triangle};
    use lumen_common::{Rotation, Transform};

    fn model_at(id: u32, position: Vec3) -> Model {
        Model::new(
            ModelId(id),
            format!("model_{id}"),
            Vec::new(),
            Transform {
                position,
                ..Transform::default()
            },
        )
    }

    fn ids(scene: &Scene) -> Vec<u32> {
        scene.models().iter().map(|m| m.id().0).collect()
    }

    #[test]
    fn scene_starts_empty() {
        let scene = Scene::new();
        assert!(scene.is_empty());
        assert!(scene.objects().is_empty());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut scene = Scene::new();
        scene.insert(model_at(0, Vec3::ZERO)).unwrap();
        let err = scene.insert(model_at(0, Vec3::ONE)).unwrap_err();
        assert_eq!(err, SceneError::DuplicateId(ModelId(0)));
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn sort_puts_farthest_first() {
        let mut scene = Scene::new();
        scene.insert(model_at(0, Vec3::ZERO)).unwrap();
        scene.insert(model_at(1, Vec3::new(0.0, 0.0, -10.0))).unwrap();
        scene.sort_back_to_front(Vec3::new(0.0, 0.0, 5.0));
        assert_eq!(ids(&scene), vec![1, 0]);
    }

    #[test]
    fn sort_orders_by_descending_distance() {
        let mut scene = Scene::new();
        for (id, d) in [(0, 3.0), (1, 9.0), (2, 1.0), (3, 27.0), (4, 5.0)] {
            scene.insert(model_at(id, Vec3::new(d, 0.0, 0.0))).unwrap();
        }
        scene.sort_back_to_front(Vec3::ZERO);
        assert_eq!(ids(&scene), vec![3, 1, 4, 0, 2]);
    }

    #[test]
    fn sort_is_stable_for_equal_distances() {
        let mut scene = Scene::new();
        scene.insert(model_at(0, Vec3::new(2.0, 0.0, 0.0))).unwrap();
        scene.insert(model_at(1, Vec3::new(-2.0, 0.0, 0.0))).unwrap();
        scene.insert(model_at(2, Vec3::new(0.0, 2.0, 0.0))).unwrap();
        scene.insert(model_at(3, Vec3::new(0.0, 0.0, 7.0))).unwrap();
        scene.sort_back_to_front(Vec3::ZERO);
        assert_eq!(ids(&scene), vec![3, 0, 1, 2]);
        // Sorting again from the same eye changes nothing.
        scene.sort_back_to_front(Vec3::ZERO);
        assert_eq!(ids(&scene), vec![3, 0, 1, 2]);
    }

    #[test]
    fn nan_positions_do_not_break_the_order() {
        let mut scene = Scene::new();
        for id in 0..200u32 {
            let position = if id % 7 == 0 {
                Vec3::new(f32::NAN, 0.0, 0.0)
            } else {
                Vec3::new(((id * 37) % 101) as f32, 0.0, 0.0)
            };
            scene.insert(model_at(id, position)).unwrap();
        }
        scene.sort_back_to_front(Vec3::ZERO);

        let distances: Vec<f32> = scene
            .models()
            .iter()
            .map(|m| m.position().x)
            .filter(|x| !x.is_nan())
            .collect();
        assert!(distances.windows(2).all(|w| w[0] >= w[1]));
        // NaN models are drawn first, as if infinitely far.
        assert!(scene.models()[..29].iter().all(|m| m.position().x.is_nan()));
    }

    #[test]
    fn lookup_survives_sorting() {
        let mut scene = Scene::new();
        scene.insert(model_at(0, Vec3::ZERO)).unwrap();
        scene.insert(model_at(1, Vec3::new(0.0, 0.0, -10.0))).unwrap();
        scene.sort_back_to_front(Vec3::new(0.0, 0.0, 5.0));
        assert_eq!(scene.get(ModelId(0)).unwrap().position(), Vec3::ZERO);
    }

    #[test]
    fn move_changes_only_position() {
        let mut scene = Scene::new();
        let transform = Transform {
            position: Vec3::ZERO,
            rotation: Rotation::new(Vec3::new(0.3, 1.0, 0.5), 33.3),
            scale: Vec3::new(0.1, 0.2, 0.3),
        };
        scene
            .insert(Model::new(ModelId(7), "m", Vec::new(), transform))
            .unwrap();

        scene
            .apply(SceneCommand::Move {
                id: ModelId(7),
                position: Vec3::new(4.0, 5.0, 6.0),
            })
            .unwrap();

        let after = scene.get(ModelId(7)).unwrap().transform();
        assert_eq!(after.position, Vec3::new(4.0, 5.0, 6.0));
        assert_eq!(after.rotation.axis.to_array().map(f32::to_bits), transform.rotation.axis.to_array().map(f32::to_bits));
        assert_eq!(after.rotation.angle_degrees.to_bits(), transform.rotation.angle_degrees.to_bits());
        assert_eq!(after.scale.to_array().map(f32::to_bits), transform.scale.to_array().map(f32::to_bits));
    }

    #[test]
    fn update_then_get_returns_written_values() {
        let mut scene = Scene::new();
        scene.insert(model_at(0, Vec3::ZERO)).unwrap();
        scene.insert(model_at(1, Vec3::ONE)).unwrap();
        let written = Transform {
            position: Vec3::new(-1.5, 2.25, 8.0),
            rotation: Rotation::new(Vec3::X, 90.0),
            scale: Vec3::splat(3.0),
        };
        scene
            .apply(SceneCommand::Update {
                id: ModelId(1),
                transform: written,
            })
            .unwrap();

        let CommandOutput::Objects(objects) = scene.apply(SceneCommand::GetObjects).unwrap() else {
            panic!("expected objects");
        };
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[1].id, ModelId(1));
        assert_eq!(objects[1].transform, written);
        assert_eq!(objects[0].transform.position, Vec3::ZERO);
    }

    #[test]
    fn rotate_and_scale_touch_one_field() {
        let mut scene = Scene::new();
        scene.insert(model_at(0, Vec3::new(1.0, 1.0, 1.0))).unwrap();
        scene
            .apply(SceneCommand::Rotate {
                id: ModelId(0),
                rotation: Rotation::new(Vec3::Z, 45.0),
            })
            .unwrap();
        scene
            .apply(SceneCommand::Scale {
                id: ModelId(0),
                scale: Vec3::splat(2.0),
            })
            .unwrap();
        let t = scene.get(ModelId(0)).unwrap().transform();
        assert_eq!(t.position, Vec3::ONE);
        assert_eq!(t.rotation, Rotation::new(Vec3::Z, 45.0));
        assert_eq!(t.scale, Vec3::splat(2.0));
    }

    #[test]
    fn unknown_id_is_not_found() {
        let mut scene = Scene::new();
        scene.insert(model_at(0, Vec3::ZERO)).unwrap();
        let err = scene
            .apply(SceneCommand::Scale {
                id: ModelId(42),
                scale: Vec3::ONE,
            })
            .unwrap_err();
        assert_eq!(err, SceneError::NotFound(ModelId(42)));
    }

    #[test]
    fn objects_are_listed_in_id_order() {
        let mut scene = Scene::new();
        scene.insert(model_at(0, Vec3::ZERO)).unwrap();
        scene.insert(model_at(1, Vec3::new(0.0, 0.0, -10.0))).unwrap();
        scene.sort_back_to_front(Vec3::new(0.0, 0.0, 5.0));
        let listed: Vec<u32> = scene.objects().iter().map(|o| o.id.0).collect();
        assert_eq!(listed, vec![0, 1]);
    }

    #[test]
    fn clear_releases_gpu_buffers() {
        let mut gpu = CountingGpu::default();
        let mut scene = Scene::new();
        let mesh = triangle(&mut gpu);
        scene
            .insert(Model::new(ModelId(0), "tri", vec![mesh], Transform::default()))
            .unwrap();
        scene.clear(&mut gpu);
        assert!(scene.is_empty());
        assert_eq!(gpu.released.len(), 1);
    }
}
