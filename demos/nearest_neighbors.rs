//! Example of building a bucket k-d tree incrementally and querying it.
//!
//! Run with `cargo run --example nearest_neighbors` to also see the tree's debug logs as buckets
//! split and grow.

use std::rc::Rc;

use bucket_kdtree::{BucketKDTree, ManhattanDistance, Point, SquaredEuclideanDistance};

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== Bucket K-D Tree Example ===\n");

    println!("1. Nearest neighbors of a query point:");
    basic_example();

    println!("\n2. Comparison of distance metrics:");
    metric_example();

    println!("\n3. Removing shared points:");
    removal_example();
}

fn basic_example() {
    let mut tree = BucketKDTree::new_with_bucket_capacity(3, 2);
    tree.add(Point::new(&[0., 0., 0.], "origin")).unwrap();
    tree.add(Point::new(&[1., 1., 1.], "one")).unwrap();
    tree.add(Point::new(&[2., 2., 2.], "two")).unwrap();
    tree.add(Point::new(&[-2., -2., -2.], "minus two")).unwrap();

    println!("  Tree holds {} points in {} buckets", tree.len(), tree.num_buckets());

    let query_point = [-1.5, -1., -1.];
    let results = tree
        .nearest_neighbors_with_distance(3, &query_point, &SquaredEuclideanDistance)
        .unwrap();

    println!("  Query point: {:?}", query_point);
    for (point, distance) in results {
        println!("    {:<10} squared distance {:.2}", point.data(), distance);
    }
}

fn metric_example() {
    let mut tree = BucketKDTree::new_with_bucket_capacity(2, 2);
    tree.add(Point::new(&[0., 3.], "A")).unwrap();
    tree.add(Point::new(&[2., 2.], "B")).unwrap();
    tree.add(Point::new(&[10., 10.], "C")).unwrap();

    let query_point = [0., 0.];
    let euclidean = tree.nearest_neighbors(1, &query_point).unwrap();
    let manhattan = tree
        .nearest_neighbors_with(1, &query_point, &ManhattanDistance)
        .unwrap();

    println!("  Query point: {:?}", query_point);
    println!("    Squared Euclidean: {}", euclidean[0].data());
    println!("    Manhattan:         {}", manhattan[0].data());
}

fn removal_example() {
    let mut tree = BucketKDTree::new_with_bucket_capacity(2, 4);
    let handles: Vec<Rc<Point<f64, usize>>> = (0..20)
        .map(|i| Rc::new(Point::new(&[i as f64, (i % 5) as f64], i)))
        .collect();
    for handle in &handles {
        tree.add(Rc::clone(handle)).unwrap();
    }

    for handle in handles.iter().step_by(2) {
        assert!(tree.remove(handle));
    }

    let remaining: Vec<usize> = tree.iter().map(|p| *p.data()).collect();
    println!("  Remaining after removing every other point: {:?}", remaining);

    let nearest = tree.nearest_neighbors(2, &[4., 4.]).unwrap();
    let nearest: Vec<usize> = nearest.iter().map(|p| *p.data()).collect();
    println!("  Two nearest to (4, 4): {:?}", nearest);
}
