/// Integration tests: encode fields through the bundled codecs and replay
/// them from nothing but the emitted record and bytes.
use blockenc_codecs::{Lz4Codec, Lz4Opts, PassThroughCodec, ZstdCodec, ZstdOpts};
use blockenc_core::hash::hash_bytes;
use blockenc_core::{
    Block, BlockCodec, BlockEncoder, Buffer, Dim, Dim1, Dim2, ElementType, EncodeError, EncodedField,
    FieldReader, FieldWriter, ScalarTag, Shape, ShapeDefaults, TypeDescriptorTag,
};

type Ragged<T> = TypeDescriptorTag<T, Dim1>;
type Matrix<T> = TypeDescriptorTag<T, Dim2>;
type Cube<T> = TypeDescriptorTag<T, Dim<3>>;

// ── helpers ───────────────────────────────────────────────────────────────

/// Generate `len` deterministic values using a simple LCG.
fn pseudo_random_i64(len: usize, seed: u64) -> Vec<i64> {
    let mut rng = seed;
    (0..len)
        .map(|_| {
            rng = rng
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (rng >> 20) as i64
        })
        .collect()
}

/// Encode each chunk as a scalar block and return the record and bytes.
fn encode_scalar_chunks<T, C>(opts: C::Opts, chunks: &[Vec<T>]) -> (EncodedField, Vec<u8>)
where
    T: ElementType,
    C: ShapeDefaults,
{
    let mut w: FieldWriter<ScalarTag<T>, C> = FieldWriter::new(opts);
    for chunk in chunks {
        let block = Block::<ScalarTag<T>>::scalar(chunk).unwrap();
        w.append(&block).unwrap();
    }
    w.finish()
}

/// Scalar chunks through codec `C` must replay to `expected`.
fn assert_scalar_roundtrip<T, C>(opts: C::Opts, chunks: &[Vec<T>], expected: &[T])
where
    T: ElementType,
    C: ShapeDefaults,
{
    let (field, bytes) = encode_scalar_chunks::<T, C>(opts, chunks);
    assert_eq!(field.items_count(), expected.len() as u64);
    assert_eq!(field.block_count(), chunks.len());
    let r = FieldReader::<ScalarTag<T>, C>::open(&field, &bytes).unwrap();
    assert_eq!(
        r.read_all().unwrap().values,
        expected,
        "{} via {}",
        T::DATA_TYPE,
        C::NAME
    );
}

/// Rows of 3, 0 and 5 values through zstd must replay shapes and values.
fn assert_ragged_roundtrip<T: ElementType>(values: &[T]) {
    let shapes: [Shape; 3] = [3, 0, 5];
    let mut w: FieldWriter<Ragged<T>, ZstdCodec> = FieldWriter::new(ZstdOpts::default());
    w.append(&Block::<Ragged<T>>::ndarray(&shapes, &values[..8]).unwrap())
        .unwrap();
    let (field, bytes) = w.finish();
    assert_eq!(field.values()[0].input_bytes as usize, 8 * T::WIDTH);

    let r = FieldReader::<Ragged<T>, ZstdCodec>::open(&field, &bytes).unwrap();
    let decoded = r.read_block(0).unwrap();
    assert_eq!(decoded.shapes, shapes, "{}", T::DATA_TYPE);
    assert_eq!(decoded.values, &values[..8], "{}", T::DATA_TYPE);
}

macro_rules! roundtrip_every_element_type {
    ($($t:ty),* $(,)?) => {$(
        {
            let values: Vec<$t> = (0..777u64).map(|i| (i * 37 % 251) as $t).collect();
            let chunks = vec![values[..500].to_vec(), values[500..].to_vec()];
            assert_scalar_roundtrip::<$t, PassThroughCodec>((), &chunks, &values);
            assert_scalar_roundtrip::<$t, ZstdCodec>(ZstdOpts::default(), &chunks, &values);
            assert_scalar_roundtrip::<$t, Lz4Codec>(Lz4Opts, &chunks, &values);
            assert_ragged_roundtrip::<$t>(&values);
        }
    )*};
}

fn ragged_rows(rows: usize) -> (Vec<Shape>, Vec<f32>) {
    let shapes: Vec<Shape> = (0..rows as u64).map(|i| i % 5).collect();
    let total: u64 = shapes.iter().sum();
    let values = (0..total).map(|i| i as f32 * 0.5).collect();
    (shapes, values)
}

// ── tests ──────────────────────────────────────────────────────────────────

#[test]
fn test_scalar_i64_scenario() {
    let values: Vec<i64> = (0..100).collect();
    let block = Block::<ScalarTag<i64>>::scalar(&values).unwrap();
    let max = BlockEncoder::<ScalarTag<i64>, ZstdCodec>::max_compressed_size(&block).unwrap();
    assert_eq!(max, ZstdCodec::max_compressed_size(800));

    let mut out = Buffer::with_size(max);
    let mut field = EncodedField::new();
    let mut pos = 0;
    BlockEncoder::<ScalarTag<i64>, ZstdCodec>::encode(
        &ZstdOpts::default(),
        &block,
        &mut field,
        &mut out,
        &mut pos,
    )
    .unwrap();

    assert_eq!(field.values().len(), 1);
    let entry = &field.values()[0];
    assert_eq!(entry.input_bytes, 800);
    assert!(entry.output_bytes as usize <= max);
    assert_eq!(entry.output_bytes as usize, pos);
    assert_eq!(out.len(), max, "pre-sized buffer must not grow");

    let bytes = &out.as_slice()[..pos];
    let reader = FieldReader::<ScalarTag<i64>, ZstdCodec>::open(&field, bytes).unwrap();
    assert_eq!(reader.read_block(0).unwrap().values, values);
}

#[test]
fn test_roundtrip_scalar_all_codecs() {
    let chunks = vec![
        pseudo_random_i64(1000, 1),
        pseudo_random_i64(17, 2),
        pseudo_random_i64(4096, 3),
    ];
    let flat: Vec<i64> = chunks.concat();

    let (field, bytes) = encode_scalar_chunks::<i64, PassThroughCodec>((), &chunks);
    let r = FieldReader::<ScalarTag<i64>, PassThroughCodec>::open(&field, &bytes).unwrap();
    assert_eq!(r.read_all().unwrap().values, flat);
    assert_eq!(r.ratio(), 1.0);

    let (field, bytes) = encode_scalar_chunks::<i64, ZstdCodec>(ZstdOpts::new(7), &chunks);
    let r = FieldReader::<ScalarTag<i64>, ZstdCodec>::open(&field, &bytes).unwrap();
    assert_eq!(r.read_all().unwrap().values, flat);

    let (field, bytes) = encode_scalar_chunks::<i64, Lz4Codec>(Lz4Opts, &chunks);
    let r = FieldReader::<ScalarTag<i64>, Lz4Codec>::open(&field, &bytes).unwrap();
    assert_eq!(r.read_all().unwrap().values, flat);
}

#[test]
fn test_roundtrip_element_types() {
    let bytes_in: Vec<u8> = (0..=255).collect();
    let (field, bytes) = encode_scalar_chunks::<u8, ZstdCodec>(ZstdOpts::default(), &[bytes_in.clone()]);
    let r = FieldReader::<ScalarTag<u8>, ZstdCodec>::open(&field, &bytes).unwrap();
    assert_eq!(r.read_all().unwrap().values, bytes_in);

    let floats: Vec<f64> = (0..300).map(|i| (i as f64).sin()).collect();
    let (field, bytes) = encode_scalar_chunks::<f64, Lz4Codec>(Lz4Opts, &[floats.clone()]);
    let r = FieldReader::<ScalarTag<f64>, Lz4Codec>::open(&field, &bytes).unwrap();
    assert_eq!(r.read_all().unwrap().values, floats);

    let shorts: Vec<i16> = (-500..500).collect();
    let (field, bytes) = encode_scalar_chunks::<i16, PassThroughCodec>((), &[shorts.clone()]);
    let r = FieldReader::<ScalarTag<i16>, PassThroughCodec>::open(&field, &bytes).unwrap();
    assert_eq!(r.read_all().unwrap().values, shorts);
}

#[test]
fn test_roundtrip_every_element_type() {
    roundtrip_every_element_type!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);
}

#[test]
fn test_roundtrip_dim3() {
    let shapes: [Shape; 6] = [2, 3, 4, 1, 1, 5];
    let values: Vec<i8> = (0..29).map(|i| i - 14).collect();
    let block = Block::<Cube<i8>>::ndarray(&shapes, &values).unwrap();
    assert_eq!(block.row_count(), 2);

    let mut w: FieldWriter<Cube<i8>, ZstdCodec> = FieldWriter::new(ZstdOpts::default());
    w.append(&block).unwrap();
    w.append(&block).unwrap();
    let (field, bytes) = w.finish();

    assert_eq!(field.items_count(), 4);
    assert_eq!(field.shapes().len(), 2);
    assert_eq!(field.shapes()[0].input_bytes, 48);
    assert_eq!(field.values()[0].input_bytes, 29);

    let r = FieldReader::<Cube<i8>, ZstdCodec>::open(&field, &bytes).unwrap();
    let decoded = r.read_block(1).unwrap();
    assert_eq!(decoded.shapes, shapes);
    assert_eq!(decoded.values, values);
    assert_eq!(r.read_all().unwrap().values, [values.clone(), values].concat());
}

#[test]
fn test_roundtrip_dim1_chunks() {
    let (s0, v0) = ragged_rows(40);
    let (s1, v1) = ragged_rows(9);

    let mut w: FieldWriter<Ragged<f32>, ZstdCodec> = FieldWriter::new(ZstdOpts::default());
    w.append(&Block::<Ragged<f32>>::ndarray(&s0, &v0).unwrap()).unwrap();
    w.append(&Block::<Ragged<f32>>::ndarray(&s1, &v1).unwrap()).unwrap();
    let (field, bytes) = w.finish();

    assert_eq!(field.items_count(), 49);
    assert_eq!(field.shapes().len(), 2);
    assert_eq!(field.values().len(), 2);

    let r = FieldReader::<Ragged<f32>, ZstdCodec>::open(&field, &bytes).unwrap();
    let b1 = r.read_block(1).unwrap();
    assert_eq!(b1.shapes, s1);
    assert_eq!(b1.values, v1);
    let all = r.read_all().unwrap();
    assert_eq!(all.shapes, [s0, s1].concat());
    assert_eq!(all.values, [v0, v1].concat());
}

#[test]
fn test_roundtrip_dim2_lz4() {
    let shapes: Vec<Shape> = vec![2, 3, 1, 1, 4, 2];
    let values: Vec<u32> = (0..15).collect();
    let block = Block::<Matrix<u32>>::ndarray(&shapes, &values).unwrap();
    assert_eq!(block.row_count(), 3);

    let mut w: FieldWriter<Matrix<u32>, Lz4Codec> = FieldWriter::new(Lz4Opts);
    w.append(&block).unwrap();
    let (field, bytes) = w.finish();

    assert_eq!(field.shapes()[0].input_bytes, 48);
    assert_eq!(field.values()[0].input_bytes, 60);
    let r = FieldReader::<Matrix<u32>, Lz4Codec>::open(&field, &bytes).unwrap();
    let decoded = r.read_block(0).unwrap();
    assert_eq!(decoded.shapes, shapes);
    assert_eq!(decoded.values, values);
}

#[test]
fn test_shape_reduction_sizes() {
    let values = [0u8; 8];
    let block = Block::<Ragged<u8>>::ndarray(&[3, 0, 5], &values).unwrap();
    let mut w: FieldWriter<Ragged<u8>, PassThroughCodec> = FieldWriter::new(());
    w.append(&block).unwrap();
    assert_eq!(w.field().values()[0].input_bytes, 8);

    let values = [0u8; 7];
    let block = Block::<Matrix<u8>>::ndarray(&[2, 3, 1, 1], &values).unwrap();
    let mut w: FieldWriter<Matrix<u8>, PassThroughCodec> = FieldWriter::new(());
    w.append(&block).unwrap();
    assert_eq!(w.field().values()[0].input_bytes, 7);
    assert_eq!(w.field().shapes()[0].input_bytes, 32);
}

#[test]
fn test_cumulative_items_count() {
    let rows = [5usize, 0, 12, 1];
    let chunks: Vec<Vec<i32>> = rows.iter().map(|&n| (0..n as i32).collect()).collect();
    let (field, _) = encode_scalar_chunks::<i32, ZstdCodec>(ZstdOpts::default(), &chunks);
    assert_eq!(field.items_count(), 18);
    assert_eq!(field.values().len(), 4);
    assert!(field.shapes().is_empty());
}

#[test]
fn test_hash_and_bytes_deterministic() {
    let values = pseudo_random_i64(2048, 0xDEAD_BEEF);
    let a = encode_scalar_chunks::<i64, ZstdCodec>(ZstdOpts::new(9), &[values.clone()]);
    let b = encode_scalar_chunks::<i64, ZstdCodec>(ZstdOpts::new(9), &[values]);
    assert_eq!(a, b);
}

#[test]
fn test_empty_block_appends_zero_sized_entry() {
    let empty: Vec<i64> = Vec::new();
    let (field, bytes) = encode_scalar_chunks::<i64, ZstdCodec>(ZstdOpts::default(), &[empty.clone()]);
    assert_eq!(field.values().len(), 1);
    let entry = &field.values()[0];
    assert_eq!(entry.input_bytes, 0);
    assert_eq!(entry.output_bytes as usize, bytes.len());
    assert_eq!(entry.hash, hash_bytes(&bytes));
    assert!(bytes.len() <= ZstdCodec::max_compressed_size(0));
    assert_eq!(
        bytes,
        zstd::bulk::compress(&[], ZstdOpts::default().level).unwrap(),
        "empty input goes through the codec, not skipped"
    );

    let r = FieldReader::<ScalarTag<i64>, ZstdCodec>::open(&field, &bytes).unwrap();
    assert!(r.read_block(0).unwrap().values.is_empty());

    let (field, _) = encode_scalar_chunks::<u8, Lz4Codec>(Lz4Opts, &[Vec::new()]);
    assert_eq!(field.values()[0].input_bytes, 0);
}

#[test]
fn test_empty_ndarray_block() {
    let mut w: FieldWriter<Matrix<f64>, PassThroughCodec> = FieldWriter::new(());
    w.append(&Block::<Matrix<f64>>::ndarray(&[], &[]).unwrap()).unwrap();
    let (field, bytes) = w.finish();
    assert_eq!(field.items_count(), 0);
    assert_eq!(field.shapes().len(), 1);
    assert_eq!(field.values().len(), 1);
    assert!(bytes.is_empty());
}

#[test]
fn test_bounded_buffer_capacity_violation() {
    let values: Vec<i64> = (0..100).collect();
    let mut w: FieldWriter<ScalarTag<i64>, PassThroughCodec> =
        FieldWriter::with_buffer((), Buffer::with_max_size(1000));
    w.append(&Block::<ScalarTag<i64>>::scalar(&values).unwrap()).unwrap();
    let err = w.append(&Block::<ScalarTag<i64>>::scalar(&values).unwrap()).unwrap_err();
    assert!(matches!(
        err,
        EncodeError::CapacityViolation {
            needed: 1600,
            available: 1000
        }
    ));
    assert_eq!(w.field().block_count(), 1);
    assert_eq!(w.position(), 800);
}

#[test]
fn test_reader_detects_corruption() {
    let values = pseudo_random_i64(256, 42);
    let (field, mut bytes) = encode_scalar_chunks::<i64, Lz4Codec>(Lz4Opts, &[values]);
    bytes[3] ^= 0xFF;
    let r = FieldReader::<ScalarTag<i64>, Lz4Codec>::open(&field, &bytes).unwrap();
    let err = r.read_block(0).unwrap_err();
    assert!(matches!(err, EncodeError::HashMismatch { .. }), "got {err}");
}

#[test]
fn test_reader_rejects_wrong_codec() {
    let (field, bytes) = encode_scalar_chunks::<u16, ZstdCodec>(ZstdOpts::default(), &[vec![1, 2, 3]]);
    let r = FieldReader::<ScalarTag<u16>, Lz4Codec>::open(&field, &bytes).unwrap();
    let err = r.read_block(0).unwrap_err().to_string();
    assert!(err.contains("codec mismatch"), "got: {err}");
}

#[test]
fn test_reader_rejects_unknown_version() {
    let (field, bytes) = encode_scalar_chunks::<u16, PassThroughCodec>((), &[vec![1, 2, 3]]);
    let mut json = serde_json::to_value(&field).unwrap();
    json["values"][0]["encoder_version"] = serde_json::json!(99);
    let tampered: EncodedField = serde_json::from_value(json).unwrap();

    let r = FieldReader::<ScalarTag<u16>, PassThroughCodec>::open(&tampered, &bytes).unwrap();
    assert!(matches!(
        r.read_block(0).unwrap_err(),
        EncodeError::VersionMismatch { found: 99, .. }
    ));
}

#[test]
fn test_reader_rejects_truncated_stream() {
    let (field, bytes) = encode_scalar_chunks::<i32, PassThroughCodec>((), &[vec![1, 2, 3]]);
    let err = FieldReader::<ScalarTag<i32>, PassThroughCodec>::open(&field, &bytes[..11])
        .err()
        .unwrap();
    assert!(matches!(err, EncodeError::Truncated { needed: 12, available: 11 }));
}

#[test]
fn test_reader_rejects_dimension_mismatch() {
    let (field, bytes) = encode_scalar_chunks::<u8, PassThroughCodec>((), &[vec![1, 2]]);
    let err = FieldReader::<Ragged<u8>, PassThroughCodec>::open(&field, &bytes)
        .err()
        .unwrap();
    assert!(matches!(err, EncodeError::ShapeMismatch(_)));
}

#[test]
fn test_block_index_out_of_range() {
    let (field, bytes) = encode_scalar_chunks::<u8, PassThroughCodec>((), &[vec![1]]);
    let r = FieldReader::<ScalarTag<u8>, PassThroughCodec>::open(&field, &bytes).unwrap();
    assert!(matches!(
        r.read_block(1).unwrap_err(),
        EncodeError::BlockIndexOutOfRange { index: 1, count: 1 }
    ));
}

#[test]
fn test_record_serde_roundtrip() {
    let (s, v) = ragged_rows(20);
    let mut w: FieldWriter<Ragged<f32>, ZstdCodec> = FieldWriter::new(ZstdOpts::new(4));
    w.append(&Block::<Ragged<f32>>::ndarray(&s, &v).unwrap()).unwrap();
    let (field, _) = w.finish();

    let json = serde_json::to_string(&field).unwrap();
    assert!(json.contains("\"codec\":\"zstd\""));
    let back: EncodedField = serde_json::from_str(&json).unwrap();
    assert_eq!(back, field);
    // shapes use the codec's shape defaults, values keep caller tuning
    assert_eq!(back.shapes()[0].codec, blockenc_core::CodecParams::Zstd { level: 0 });
    assert_eq!(back.values()[0].codec, blockenc_core::CodecParams::Zstd { level: 4 });
}
