pub mod homogeneous;
