use burn::tensor::{backend::Backend, Data, Int, Shape, Tensor};

/// Stack equal-width rows of token ids into a `[rows, width]` integer tensor
pub fn int_matrix<B: Backend>(rows: &[Vec<usize>], device: &B::Device) -> Tensor<B, 2, Int> {
    let height = rows.len();
    let width = rows.first().map(Vec::len).unwrap_or(0);

    let values = rows
        .iter()
        .flat_map(|row| row.iter().map(|&value| value as i32))
        .collect::<Vec<_>>();

    Tensor::from_ints(Data::new(values, Shape::new([height, width])), device)
}

/// Stack equal-width rows of 0/1 targets into a `[rows, width]` float tensor
pub fn float_matrix<B: Backend>(rows: &[Vec<u8>], device: &B::Device) -> Tensor<B, 2> {
    let height = rows.len();
    let width = rows.first().map(Vec::len).unwrap_or(0);

    let values = rows
        .iter()
        .flat_map(|row| row.iter().map(|&value| value as f32))
        .collect::<Vec<_>>();

    Tensor::from_floats(Data::new(values, Shape::new([height, width])), device)
}

/// Copy a `[rows, width]` float tensor back to host rows
pub fn to_rows<B: Backend>(tensor: Tensor<B, 2>) -> Vec<Vec<f32>> {
    let [_, width] = tensor.dims();
    let values = tensor.into_data().convert::<f32>().value;

    if width == 0 {
        return Vec::new();
    }

    values.chunks(width).map(<[f32]>::to_vec).collect()
}
