//! Determinism verification tests
//!
//! The particle field and the scene catalog must reproduce exactly for a seed.

use journey_core::config::ParticleConfig;
use journey_core::particles::ParticleField;
use journey_core::scene::default_catalog;

fn field(seed: u64) -> ParticleField {
    let config = ParticleConfig {
        seed,
        ..Default::default()
    };
    ParticleField::with_capacity(&config, 500)
}

/// Same seed, same steps, same particles
#[test]
fn test_particle_field_determinism() {
    let mut a = field(42);
    let mut b = field(42);

    for step in 0..300 {
        let intensity = (step as f32 / 100.0).min(4.0);
        a.integrate(intensity, 1.0);
        b.integrate(intensity, 1.0);
    }

    assert_eq!(a.positions(), b.positions(), "Positions should match for the same seed");
    assert_eq!(a.sizes(), b.sizes());
    assert_eq!(a.recycled_count(), b.recycled_count());
}

/// Different seeds diverge
#[test]
fn test_particle_field_different_seeds() {
    let a = field(42);
    let b = field(43);
    assert_ne!(a.positions(), b.positions(), "Different seeds should produce different fields");
}

/// Catalog placement is seeded too
#[test]
fn test_catalog_determinism() {
    assert_eq!(default_catalog(7), default_catalog(7));
    assert_ne!(default_catalog(7), default_catalog(8));
}
