//! Integration tests for the dense tensor surface used by the engines

use cpals_core::{CoreError, DenseND};

#[test]
fn test_views_never_reshape_the_source() {
    let data: Vec<f64> = (0..60).map(|x| x as f64).collect();
    let tensor = DenseND::from_vec(data, &[3, 4, 5]).unwrap();

    {
        let m = tensor.matrix_view(12, 5).unwrap();
        assert_eq!(m[[11, 4]], 59.0);
        let sub = tensor.sub_view(&[1, 0, 2], &[3, 2, 5]).unwrap();
        assert_eq!(sub.shape(), &[2, 2, 3]);
    }

    assert_eq!(tensor.shape(), &[3, 4, 5]);
    assert_eq!(tensor[&[2, 3, 4][..]], 59.0);
}

#[test]
fn test_unfold_agrees_with_indexing() {
    let tensor = DenseND::<f64>::from_fn(&[2, 3, 4, 2], |i| {
        (i[0] * 100 + i[1] * 10 + i[2]) as f64 + 0.5 * i[3] as f64
    });
    let m = tensor.unfold(2).unwrap();
    assert_eq!(m.shape(), &[4, 12]);
    for a in 0..2 {
        for b in 0..3 {
            for c in 0..4 {
                for d in 0..2 {
                    let col = (a * 3 + b) * 2 + d;
                    assert_eq!(m[[c, col]], tensor[&[a, b, c, d][..]]);
                }
            }
        }
    }
}

#[test]
fn test_matrix_routines_on_tensor_fail_fast() {
    let tensor = DenseND::<f64>::ones(&[2, 3, 4]);
    let err = tensor.svd().unwrap_err();
    assert_eq!(
        err,
        CoreError::NotAMatrix {
            op: "svd",
            order: 3
        }
    );
}

#[test]
fn test_residual_norm_of_copy_is_zero() {
    let tensor = DenseND::<f64>::from_fn(&[3, 3], |i| (i[0] + 2 * i[1]) as f64);
    let copy = tensor.clone();
    assert_eq!(tensor.residual_norm(&copy).unwrap(), 0.0);
}
