use surface_kmc::core::domain::{Coord, SiteKind};
use surface_kmc::core::lattice::Lattice;
use surface_kmc::core::spatial;
use surface_kmc::engine::registry::SurfaceAtomRegistry;

use crate::common::seeded;

mod common;

fn site_of(lattice: &Lattice, kind: SiteKind) -> Coord {
    lattice
        .sites()
        .find(|s| s.kind == kind)
        .map(|s| s.coord)
        .expect("lattice has a site of this kind")
}

#[test]
fn test_lattice_classification() {
    let mut rng = seeded(1);
    let lattice = Lattice::new(100, 100, 0.002, &mut rng).unwrap();

    assert_eq!(lattice.total_sites(), 10_000);
    assert_eq!(lattice.sites_of(SiteKind::S), 20);
    assert_eq!(lattice.sites_of(SiteKind::F), 9_980);
    assert_eq!(lattice.count_free(SiteKind::S), 20);
    assert_eq!(lattice.count_free(SiteKind::F), 9_980);

    let s_sites = lattice.sites().filter(|s| s.kind == SiteKind::S).count();
    assert_eq!(s_sites, 20);
    assert!(lattice.sites().all(|s| s.is_free && s.atom.is_none()));
}

#[test]
fn test_same_seed_same_lattice() {
    let a = Lattice::new(30, 30, 0.05, &mut seeded(9)).unwrap();
    let b = Lattice::new(30, 30, 0.05, &mut seeded(9)).unwrap();
    let kinds = |l: &Lattice| l.sites().map(|s| s.kind).collect::<Vec<_>>();
    assert_eq!(kinds(&a), kinds(&b));
}

#[test]
fn test_registry_partitions_follow_site_kind() {
    let mut rng = seeded(2);
    let mut lattice = Lattice::new(2, 1, 0.5, &mut rng).unwrap();
    let mut registry = SurfaceAtomRegistry::new(&lattice);

    let f = lattice.site(site_of(&lattice, SiteKind::F)).unwrap();
    let s = lattice.site(site_of(&lattice, SiteKind::S)).unwrap();

    let on_f = registry.place(&mut lattice, &f).unwrap();
    let on_s = registry.place(&mut lattice, &s).unwrap();
    assert_ne!(on_f.id, on_s.id);
    assert_eq!(registry.count_on(SiteKind::F), 1);
    assert_eq!(registry.count_on(SiteKind::S), 1);
    assert_eq!(lattice.count_free(SiteKind::F), 0);
    assert_eq!(lattice.count_free(SiteKind::S), 0);
    assert!(registry.is_consistent(&lattice));

    registry.remove(&mut lattice, on_s.id).unwrap();
    assert_eq!(registry.count_on(SiteKind::S), 0);
    assert_eq!(lattice.count_free(SiteKind::S), 1);
    assert!(registry.is_consistent(&lattice));
}

#[test]
fn test_move_changes_partition() {
    let mut rng = seeded(3);
    let mut lattice = Lattice::new(2, 1, 0.5, &mut rng).unwrap();
    let mut registry = SurfaceAtomRegistry::new(&lattice);

    let f = lattice.site(site_of(&lattice, SiteKind::F)).unwrap();
    let atom = registry.place(&mut lattice, &f).unwrap();

    let s = lattice.site(site_of(&lattice, SiteKind::S)).unwrap();
    let moved = registry.move_atom(&mut lattice, atom.id, &s).unwrap();

    assert_eq!(moved.kind, SiteKind::S);
    assert_eq!(moved.coord, s.coord);
    assert_eq!(registry.count_on(SiteKind::F), 0);
    assert_eq!(registry.count_on(SiteKind::S), 1);
    assert!(lattice.site(f.coord).unwrap().is_free);
    assert_eq!(lattice.site(s.coord).unwrap().atom, Some(atom.id));
    assert!(registry.is_consistent(&lattice));
}

#[test]
fn test_double_placement_is_rejected() {
    let mut rng = seeded(4);
    let mut lattice = Lattice::new(3, 3, 0.0, &mut rng).unwrap();
    let mut registry = SurfaceAtomRegistry::new(&lattice);

    let site = lattice.site(Coord::new(1, 1)).unwrap();
    registry.place(&mut lattice, &site).unwrap();
    assert!(registry.place(&mut lattice, &site).is_err());
    assert_eq!(registry.len(), 1);
    assert!(registry.is_consistent(&lattice));
}

#[test]
fn test_corner_neighbours_stay_in_bounds() {
    let mut rng = seeded(5);
    for _ in 0..500 {
        let n = spatial::random_neighbour(Coord::new(0, 0), 10, 10, &mut rng).unwrap();
        assert!(n == Coord::new(1, 0) || n == Coord::new(0, 1), "got {n:?}");
    }
}
