use crate::backend::RenderBackend;
use glam::Vec3;

/// Sun-like light with constant direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
}

/// Camera-attached flashlight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotLight {
    pub enabled: bool,
    pub position: Vec3,
    pub direction: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
    /// Cosine of the inner cone angle.
    pub cut_off: f32,
    /// Cosine of the outer cone angle.
    pub outer_cut_off: f32,
}

/// Light uniforms for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingParameters {
    pub view_position: Vec3,
    pub directional: DirectionalLight,
    pub spot: SpotLight,
}

pub const SUN: DirectionalLight = DirectionalLight {
    direction: Vec3::new(-0.2, -1.0, -0.3),
    ambient: Vec3::splat(0.2),
    diffuse: Vec3::splat(0.5),
    specular: Vec3::splat(1.0),
};

pub const ATTENUATION_CONSTANT: f32 = 1.0;
pub const ATTENUATION_LINEAR: f32 = 0.09;
pub const ATTENUATION_QUADRATIC: f32 = 0.032;
pub const SPOT_INNER_DEGREES: f32 = 12.5;
pub const SPOT_OUTER_DEGREES: f32 = 15.0;

impl LightingParameters {
    /// Build the frame's light set from the camera pose.
    pub fn assemble(camera_position: Vec3, camera_front: Vec3, spot_enabled: bool) -> Self {
        Self {
            view_position: camera_position,
            directional: SUN,
            spot: SpotLight {
                enabled: spot_enabled,
                position: camera_position,
                direction: camera_front,
                ambient: Vec3::ZERO,
                diffuse: Vec3::ONE,
                specular: Vec3::ONE,
                constant: ATTENUATION_CONSTANT,
                linear: ATTENUATION_LINEAR,
                quadratic: ATTENUATION_QUADRATIC,
                cut_off: SPOT_INNER_DEGREES.to_radians().cos(),
                outer_cut_off: SPOT_OUTER_DEGREES.to_radians().cos(),
            },
        }
    }

    /// Upload to the lighting program. Spot light details are only sent
    /// while it is enabled.
    pub fn apply(&self, backend: &mut dyn RenderBackend) {
        backend.set_vec3("viewPos", self.view_position);

        let sun = &self.directional;
        backend.set_vec3("dirLight.direction", sun.direction);
        backend.set_vec3("dirLight.ambient", sun.ambient);
        backend.set_vec3("dirLight.diffuse", sun.diffuse);
        backend.set_vec3("dirLight.specular", sun.specular);

        backend.set_int("pointLightCount", 0);

        let spot = &self.spot;
        backend.set_bool("spotLight.enabled", spot.enabled);
        if !spot.enabled {
            return;
        }
        backend.set_vec3("spotLight.position", spot.position);
        backend.set_vec3("spotLight.direction", spot.direction);
        backend.set_vec3("spotLight.ambient", spot.ambient);
        backend.set_vec3("spotLight.diffuse", spot.diffuse);
        backend.set_vec3("spotLight.specular", spot.specular);
        backend.set_float("spotLight.constant", spot.constant);
        backend.set_float("spotLight.linear", spot.linear);
        backend.set_float("spotLight.quadratic", spot.quadratic);
        backend.set_float("spotLight.cutOff", spot.cut_off);
        backend.set_float("spotLight.outerCutOff", spot.outer_cut_off);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{Command, RecordingBackend};

    #[test]
    fn spot_follows_camera() {
        let params = LightingParameters::assemble(Vec3::new(1.0, 2.0, 3.0), Vec3::NEG_Z, true);
        assert_eq!(params.spot.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(params.spot.direction, Vec3::NEG_Z);
        assert_eq!(params.view_position, Vec3::new(1.0, 2.0, 3.0));
        assert!(params.spot.cut_off > params.spot.outer_cut_off);
    }

    #[test]
    fn assembly_is_pure() {
        let a = LightingParameters::assemble(Vec3::ONE, Vec3::X, false);
        let b = LightingParameters::assemble(Vec3::ONE, Vec3::X, false);
        assert_eq!(a, b);
    }

    #[test]
    fn disabled_spot_sends_only_the_flag() {
        let mut backend = RecordingBackend::new();
        LightingParameters::assemble(Vec3::ZERO, Vec3::NEG_Z, false).apply(&mut backend);
        assert_eq!(backend.bool_uniform("spotLight.enabled"), Some(false));
        assert_eq!(backend.int_uniform("pointLightCount"), Some(0));
        assert!(
            !backend
                .commands()
                .iter()
                .any(|c| matches!(c, Command::SetFloat(name, _) if name.starts_with("spotLight.")))
        );
    }

    #[test]
    fn enabled_spot_sends_cone_and_attenuation() {
        let mut backend = RecordingBackend::new();
        LightingParameters::assemble(Vec3::ZERO, Vec3::NEG_Z, true).apply(&mut backend);
        assert_eq!(backend.bool_uniform("spotLight.enabled"), Some(true));
        assert_eq!(backend.float_uniform("spotLight.linear"), Some(0.09));
        assert_eq!(
            backend.float_uniform("spotLight.outerCutOff"),
            Some(15.0_f32.to_radians().cos())
        );
        assert_eq!(backend.vec3_uniform("dirLight.direction"), Some(SUN.direction));
    }
}
