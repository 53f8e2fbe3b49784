//! Integration tests across the kernel modules

use cpals_core::DenseND;
use cpals_kernels::*;
use scirs2_core::ndarray_ext::{array, Array1, Array2};

#[test]
fn test_rank_one_mttkrp_recovers_vector() {
    let a = array![[1.0_f64], [2.0], [3.0], [4.0]];
    let b = array![[1.0], [0.0], [-1.0], [2.0], [0.5]];
    let c = array![[2.0], [1.0], [0.0], [1.0], [1.0], [3.0]];
    let w = Array1::from(vec![1.0]);

    let x = cp_reconstruct(&[a.view(), b.view(), c.view()], &w.view()).unwrap();
    let tensor = DenseND::from_array(x);
    assert_eq!(tensor.shape(), &[4, 5, 6]);

    // with the true factors, the mode-0 update is a scaled copy of a
    let m = mttkrp_direct(&tensor.view(), &[a.view(), b.view(), c.view()], 0).unwrap();
    let scale = b.column(0).dot(&b.column(0)) * c.column(0).dot(&c.column(0));
    for i in 0..4 {
        assert!((m[[i, 0]] - a[[i, 0]] * scale).abs() < 1e-10);
    }
}

#[test]
fn test_unfold_times_krp_matches_core_unfold() {
    let tensor = DenseND::<f64>::from_fn(&[3, 2, 4], |i| (i[0] * 8 + i[1] * 4 + i[2]) as f64);
    let factors = [
        Array2::from_shape_fn((3, 2), |(i, j)| (i + j) as f64),
        Array2::from_shape_fn((2, 2), |(i, j)| (i * 2 + j) as f64),
        Array2::from_shape_fn((4, 2), |(i, j)| 1.0 + (i * j) as f64),
    ];
    let views: Vec<_> = factors.iter().map(|f| f.view()).collect();

    for mode in 0..3 {
        let by_core = tensor
            .unfold(mode)
            .unwrap()
            .dot(&khatri_rao_except(&views, mode).unwrap());
        let direct = mttkrp_direct(&tensor.view(), &views, mode).unwrap();
        assert_eq!(by_core, direct);
    }
}

#[test]
fn test_projection_onto_full_basis_is_lossless() {
    let tensor = DenseND::<f64>::from_fn(&[3, 3, 2], |i| (i[0] + 2 * i[1]) as f64 - i[2] as f64);
    let eye = Array2::<f64>::eye(3);
    let core = nmode_product(&tensor.view(), &eye.t(), 0).unwrap();
    let back = nmode_product(&core.view(), &eye.view(), 0).unwrap();
    assert_eq!(back, tensor.view());
}
