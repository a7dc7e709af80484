//! Property-based checks of the numeric building blocks.

use cfd_post::prelude::*;
use proptest::prelude::*;

proptest! {
    /// The vector reduction is the Euclidean norm: non-negative and
    /// never smaller than any single component.
    #[test]
    fn magnitude_is_euclidean(x in -1e6f64..1e6, y in -1e6f64..1e6, z in -1e6f64..1e6) {
        let array = DataArray::vectors("U", vec![x, y, z]).unwrap();
        let m = array.magnitude(0).unwrap();
        let expected = (x * x + y * y + z * z).sqrt();
        prop_assert!((m - expected).abs() <= 1e-9 * expected.max(1.0));
        prop_assert!(m >= x.abs().max(y.abs()).max(z.abs()) - 1e-9);
    }

    /// Scalar tuples pass through the reduction unchanged, sign included.
    #[test]
    fn magnitude_passes_scalars_through(v in -1e6f64..1e6) {
        let array = DataArray::scalars("p", vec![v]);
        prop_assert_eq!(array.magnitude(0), Some(v));
    }

    /// Instants at the same time are equal yet still strictly ordered
    /// against any later instant.
    #[test]
    fn instant_equality_and_ordering(t in -1e9f64..1e9, dt in 1e-3f64..1e3) {
        let a = Instant::new(t);
        let b = Instant::new(t);
        let later = Instant::new(t + dt);
        prop_assert_eq!(&a, &b);
        prop_assert!(a < later);
        prop_assert!(later > a);
    }

    /// The closest-instant lookup returns a global distance minimum.
    #[test]
    fn closest_instant_minimizes_distance(
        times in proptest::collection::vec(-1e3f64..1e3, 1..20),
        query in -1e3f64..1e3,
    ) {
        let mut collection = InstantCollection::new();
        for &t in &times {
            collection.push(Instant::new(t));
        }
        let found = collection.find_closest_instant(query).unwrap();
        let best = times
            .iter()
            .map(|t| (t - query).abs())
            .fold(f64::INFINITY, f64::min);
        prop_assert!((found.time_value() - query).abs() <= best + 1e-12);
    }

    /// Appending datasets preserves total point and cell counts.
    #[test]
    fn append_preserves_counts(sizes in proptest::collection::vec(0usize..30, 1..5)) {
        let blocks: Vec<DataObject> = sizes
            .iter()
            .map(|&n| {
                let points = (0..n).map(|i| [i as f64, 0.0, 0.0]).collect();
                DataObject::Set(DataSet::from_geometry(points, vec![]).unwrap())
            })
            .collect();
        let merged = cfd_post::dataset::append_all(blocks.iter());
        prop_assert_eq!(merged.num_points(), sizes.iter().sum::<usize>());
    }
}
