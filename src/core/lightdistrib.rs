//! Strategies for picking which light next-event estimation talks to.

// std
use std::collections::HashMap;
use std::sync::Arc;
// lumen
use crate::core::light::Light;
use crate::core::lumen::Float;
use crate::core::sampling::Distribution1D;

#[derive(Clone)]
pub struct SampledLight {
    pub light: Arc<dyn Light>,
    pub pmf: Float,
}

pub trait LightSampler: Send + Sync {
    fn sample(&self, u: Float) -> Option<SampledLight>;
    fn pmf(&self, light: &Arc<dyn Light>) -> Float;
}

fn light_key(light: &Arc<dyn Light>) -> usize {
    Arc::as_ptr(light) as *const () as usize
}

pub struct UniformLightSampler {
    lights: Vec<Arc<dyn Light>>,
}

impl UniformLightSampler {
    pub fn new(lights: Vec<Arc<dyn Light>>) -> Self {
        UniformLightSampler { lights }
    }
}

impl LightSampler for UniformLightSampler {
    fn sample(&self, u: Float) -> Option<SampledLight> {
        let count: usize = self.lights.len();
        if count == 0 {
            return None;
        }
        let index: usize = ((u * count as Float) as usize).min(count - 1);
        Some(SampledLight {
            light: self.lights[index].clone(),
            pmf: 1.0 as Float / count as Float,
        })
    }
    fn pmf(&self, _light: &Arc<dyn Light>) -> Float {
        if self.lights.is_empty() {
            0.0
        } else {
            1.0 as Float / self.lights.len() as Float
        }
    }
}

/// Selects lights proportionally to their emitted power.
pub struct PowerLightSampler {
    lights: Vec<Arc<dyn Light>>,
    distribution: Distribution1D,
    light_to_index: HashMap<usize, usize>,
}

impl PowerLightSampler {
    pub fn new(lights: Vec<Arc<dyn Light>>) -> Self {
        let mut powers: Vec<Float> = Vec::with_capacity(lights.len());
        let mut light_to_index: HashMap<usize, usize> = HashMap::new();
        for (i, light) in lights.iter().enumerate() {
            // guard against all-zero power scenes
            powers.push(light.phi().luminance().max(1e-8));
            light_to_index.insert(light_key(light), i);
        }
        let distribution: Distribution1D = Distribution1D::new(powers);
        PowerLightSampler {
            lights,
            distribution,
            light_to_index,
        }
    }
}

impl LightSampler for PowerLightSampler {
    fn sample(&self, u: Float) -> Option<SampledLight> {
        if self.lights.is_empty() {
            return None;
        }
        let mut pmf: Float = 0.0;
        let index: usize = self.distribution.sample_discrete(u, Some(&mut pmf));
        Some(SampledLight {
            light: self.lights[index].clone(),
            pmf,
        })
    }
    fn pmf(&self, light: &Arc<dyn Light>) -> Float {
        if let Some(index) = self.light_to_index.get(&light_key(light)) {
            self.distribution.discrete_pdf(*index)
        } else {
            0.0
        }
    }
}
