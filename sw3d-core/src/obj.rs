//! Wavefront OBJ subset: `v`, `vt`, `vn` and `f` records
//!
//! Import is all-or-nothing: the first malformed line aborts with its line
//! number, and the finished mesh must pass [`Mesh::validate`].
use log::debug;
use nom::{
    character::complete::{char, i64 as integer},
    combinator::{all_consuming, opt},
    number::complete::double,
    sequence::{pair, preceded},
    IResult,
};

use crate::error::{ObjError, ParseErrorKind, PolygonError, WriteError};
use crate::geometry::{Mesh, Polygon, PolygonBuilder};
use crate::math::{Vector2, Vector3};

const BYTE_ORDER_MARK: char = '\u{feff}';

/// One `v[/vt][/vn]` reference as written, before index resolution
#[derive(Debug, Clone, Copy, PartialEq)]
struct FaceRef {
    vertex: i64,
    texture: Option<i64>,
    normal: Option<i64>,
}

fn parse_face_ref(input: &str) -> IResult<&str, FaceRef> {
    let (input, vertex) = integer(input)?;
    let (input, rest) = opt(preceded(
        char('/'),
        pair(opt(integer), opt(preceded(char('/'), integer))),
    ))(input)?;
    let (texture, normal) = rest.unwrap_or((None, None));
    Ok((
        input,
        FaceRef {
            vertex,
            texture,
            normal,
        },
    ))
}

fn face_ref(token: &str) -> Result<FaceRef, ParseErrorKind> {
    let malformed = || ParseErrorKind::MalformedReference {
        token: token.to_string(),
    };
    let (_, reference) = all_consuming(parse_face_ref)(token).map_err(|_| malformed())?;
    // "1/" carries a separator but no index
    if token.contains('/') && reference.texture.is_none() && reference.normal.is_none() {
        return Err(malformed());
    }
    Ok(reference)
}

fn number(token: &str) -> Result<f64, ParseErrorKind> {
    let parsed: IResult<&str, f64> = all_consuming(double)(token);
    match parsed {
        Ok((_, value)) if value.is_finite() => Ok(value),
        _ => Err(ParseErrorKind::InvalidNumber {
            token: token.to_string(),
        }),
    }
}

fn numbers(
    record: &'static str,
    args: &[&str],
    min: usize,
    max: usize,
    expected: &'static str,
) -> Result<Vec<f64>, ParseErrorKind> {
    if args.len() < min || args.len() > max {
        return Err(ParseErrorKind::FieldCount {
            record,
            expected,
            found: args.len(),
        });
    }
    args.iter().map(|token| number(token)).collect()
}

/// Resolves a 1-based or negative (relative) index against `len` elements
fn resolve(index: i64, len: usize, attribute: &'static str) -> Result<usize, ParseErrorKind> {
    let out_of_range = || ParseErrorKind::IndexOutOfRange {
        attribute,
        index,
        len,
    };
    match index {
        0 => Err(ParseErrorKind::ZeroIndex { attribute }),
        i if i > 0 => match usize::try_from(i) {
            Ok(i) if i <= len => Ok(i - 1),
            _ => Err(out_of_range()),
        },
        i => match usize::try_from(i.unsigned_abs()) {
            Ok(back) if back <= len => Ok(len - back),
            _ => Err(out_of_range()),
        },
    }
}

fn parse_face(mesh: &Mesh, args: &[&str]) -> Result<Polygon, ParseErrorKind> {
    if args.len() < 3 {
        return Err(ParseErrorKind::TooFewReferences(args.len()));
    }
    let refs = args
        .iter()
        .map(|token| face_ref(token))
        .collect::<Result<Vec<_>, _>>()?;

    let has_texture = refs[0].texture.is_some();
    let has_normal = refs[0].normal.is_some();
    if refs
        .iter()
        .any(|r| r.texture.is_some() != has_texture || r.normal.is_some() != has_normal)
    {
        return Err(ParseErrorKind::InconsistentFaceFormat);
    }

    let mut builder = PolygonBuilder::new();
    for reference in &refs {
        builder = builder.vertex(resolve(reference.vertex, mesh.vertices.len(), "vertex")?);
        if let Some(t) = reference.texture {
            let len = mesh.texture_coords.len();
            builder = builder.texture_coord(resolve(t, len, "texture coordinate")?);
        }
        if let Some(n) = reference.normal {
            builder = builder.normal(resolve(n, mesh.normals.len(), "normal")?);
        }
    }

    builder.build().map_err(|err| match err {
        PolygonError::DuplicateVertex(index) => ParseErrorKind::DuplicateVertex {
            index: index as i64 + 1,
        },
        PolygonError::TooFewVertices(n) => ParseErrorKind::TooFewReferences(n),
        PolygonError::AttributeCountMismatch { .. } => ParseErrorKind::InconsistentFaceFormat,
    })
}

fn parse_line(mesh: &mut Mesh, line: &str) -> Result<(), ParseErrorKind> {
    let content = line.split('#').next().unwrap_or_default();
    let mut tokens = content.split_whitespace();
    let Some(keyword) = tokens.next() else {
        return Ok(());
    };
    let args: Vec<&str> = tokens.collect();

    match keyword {
        "v" => {
            let c = numbers("v", &args, 3, 4, "3 or 4")?;
            mesh.add_vertex(Vector3::new(c[0], c[1], c[2]));
        }
        "vt" => {
            let c = numbers("vt", &args, 2, 3, "2 or 3")?;
            mesh.add_texture_coord(Vector2::new(c[0], c[1]));
        }
        "vn" => {
            let c = numbers("vn", &args, 3, 3, "exactly 3")?;
            mesh.add_normal(Vector3::new(c[0], c[1], c[2]));
        }
        "f" => {
            let polygon = parse_face(mesh, &args)?;
            mesh.add_polygon(polygon);
        }
        _ => {}
    }
    Ok(())
}

/// Parse OBJ text into a validated mesh
pub fn parse_obj(input: &str) -> Result<Mesh, ObjError> {
    let input = input.strip_prefix(BYTE_ORDER_MARK).unwrap_or(input);

    let mut mesh = Mesh::new();
    for (i, line) in input.lines().enumerate() {
        parse_line(&mut mesh, line).map_err(|kind| ObjError::Parse { line: i + 1, kind })?;
    }
    mesh.validate()?;

    debug!(
        "parsed OBJ: {} vertices, {} texture coords, {} normals, {} faces",
        mesh.vertices.len(),
        mesh.texture_coords.len(),
        mesh.normals.len(),
        mesh.polygons.len()
    );
    Ok(mesh)
}

/// Shortest decimal that round-trips, without exponent or trailing zeros
fn format_number(value: f64) -> String {
    if value == 0.0 {
        // also folds -0 into 0
        "0".to_string()
    } else {
        value.to_string()
    }
}

fn check_finite<'a, I>(record: &'static str, values: I) -> Result<(), WriteError>
where
    I: IntoIterator<Item = &'a [f64]>,
{
    match values
        .into_iter()
        .position(|components| components.iter().any(|c| !c.is_finite()))
    {
        Some(index) => Err(WriteError::NonFinite { record, index }),
        None => Ok(()),
    }
}

fn push_record(out: &mut String, tag: &str, components: &[f64]) {
    out.push_str(tag);
    for &c in components {
        out.push(' ');
        out.push_str(&format_number(c));
    }
    out.push('\n');
}

fn face_token(polygon: &Polygon, i: usize) -> String {
    let v = polygon.vertex_indices()[i] + 1;
    let t = polygon.texture_indices().map(|t| t[i] + 1);
    let n = polygon.normal_indices().map(|n| n[i] + 1);
    match (t, n) {
        (None, None) => format!("{v}"),
        (Some(t), None) => format!("{v}/{t}"),
        (None, Some(n)) => format!("{v}//{n}"),
        (Some(t), Some(n)) => format!("{v}/{t}/{n}"),
    }
}

/// Serialize a mesh as OBJ text: vertices, texture coordinates, normals, faces.
///
/// Fails without producing any output if a coordinate is NaN or infinite.
pub fn write_obj(mesh: &Mesh) -> Result<String, WriteError> {
    let vertices: Vec<[f64; 3]> = mesh.vertices.iter().map(|v| v.to_array()).collect();
    let texture_coords: Vec<[f64; 2]> = mesh.texture_coords.iter().map(|t| t.to_array()).collect();
    let normals: Vec<[f64; 3]> = mesh.normals.iter().map(|n| n.to_array()).collect();

    check_finite("vertex", vertices.iter().map(|c| &c[..]))?;
    check_finite("texture coordinate", texture_coords.iter().map(|c| &c[..]))?;
    check_finite("normal", normals.iter().map(|c| &c[..]))?;

    let mut out = String::new();
    for c in &vertices {
        push_record(&mut out, "v", c);
    }
    for c in &texture_coords {
        push_record(&mut out, "vt", c);
    }
    for c in &normals {
        push_record(&mut out, "vn", c);
    }
    for polygon in &mesh.polygons {
        out.push('f');
        for i in 0..polygon.len() {
            out.push(' ');
            out.push_str(&face_token(polygon, i));
        }
        out.push('\n');
    }

    debug!(
        "wrote OBJ: {} vertices, {} faces, {} bytes",
        mesh.vertices.len(),
        mesh.polygons.len(),
        out.len()
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationIssue;

    fn parse_err(input: &str) -> (usize, ParseErrorKind) {
        match parse_obj(input) {
            Err(ObjError::Parse { line, kind }) => (line, kind),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_single_triangle() {
        let mesh = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.polygons.len(), 1);
        assert_eq!(mesh.polygons[0].vertex_indices(), &[0, 1, 2]);
        assert_eq!(mesh.vertices[1], Vector3::X);
    }

    #[test]
    fn test_out_of_range_index_is_reported() {
        let (line, kind) = parse_err("v 0 0 0\nf 1 2 3\n");
        assert_eq!(line, 2);
        assert_eq!(
            kind,
            ParseErrorKind::IndexOutOfRange {
                attribute: "vertex",
                index: 2,
                len: 1
            }
        );
    }

    #[test]
    fn test_all_reference_forms() {
        let input = "\
v 0 0 0
v 1 0 0
v 1 1 0
vt 0 0
vt 1 0
vt 1 1
vn 0 0 1
f 1 2 3
f 1/1 2/2 3/3
f 1//1 2//1 3//1
f 1/1/1 2/2/1 3/3/1
";
        let mesh = parse_obj(input).unwrap();
        let p = &mesh.polygons;
        assert_eq!((p[0].texture_indices(), p[0].normal_indices()), (None, None));
        assert_eq!(p[1].texture_indices(), Some(&[0, 1, 2][..]));
        assert_eq!(p[1].normal_indices(), None);
        assert_eq!(p[2].texture_indices(), None);
        assert_eq!(p[2].normal_indices(), Some(&[0, 0, 0][..]));
        assert_eq!(p[3].texture_indices(), Some(&[0, 1, 2][..]));
        assert_eq!(p[3].normal_indices(), Some(&[0, 0, 0][..]));
    }

    #[test]
    fn test_negative_indices_are_relative() {
        let mesh = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\nv 5 5 5\nf -1 1 2\n").unwrap();
        assert_eq!(mesh.polygons[0].vertex_indices(), &[0, 1, 2]);
        assert_eq!(mesh.polygons[1].vertex_indices(), &[3, 0, 1]);
    }

    #[test]
    fn test_zero_and_empty_relative_index() {
        let (_, kind) = parse_err("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 0 1 2\n");
        assert_eq!(kind, ParseErrorKind::ZeroIndex { attribute: "vertex" });

        let (line, kind) = parse_err("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1/-1 2/-1 3/-1\n");
        assert_eq!(line, 4);
        assert!(matches!(
            kind,
            ParseErrorKind::IndexOutOfRange { attribute: "texture coordinate", index: -1, len: 0 }
        ));
    }

    #[test]
    fn test_mixed_face_format_is_rejected() {
        let input = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nf 1/1 2 3/1\n";
        assert_eq!(parse_err(input), (5, ParseErrorKind::InconsistentFaceFormat));
        let input = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3\n";
        assert_eq!(parse_err(input).1, ParseErrorKind::InconsistentFaceFormat);
    }

    #[test]
    fn test_duplicate_vertex_in_face() {
        let (line, kind) = parse_err("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 -3\n");
        assert_eq!(line, 4);
        assert_eq!(kind, ParseErrorKind::DuplicateVertex { index: 1 });
    }

    #[test]
    fn test_field_counts() {
        assert!(matches!(
            parse_err("v 1 2\n").1,
            ParseErrorKind::FieldCount { record: "v", found: 2, .. }
        ));
        assert!(matches!(
            parse_err("vn 0 0 1 0\n").1,
            ParseErrorKind::FieldCount { record: "vn", found: 4, .. }
        ));
        assert_eq!(
            parse_err("v 0 0 0\nv 1 0 0\nf 1 2\n").1,
            ParseErrorKind::TooFewReferences(2)
        );
    }

    #[test]
    fn test_optional_w_is_ignored() {
        let mesh = parse_obj("v 1 2 3 0.5\nv 0 0 0\nv 1 0 0\nvt 0.25 0.75 0\nf 1/1 2/1 3/1\n").unwrap();
        assert_eq!(mesh.vertices[0], Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(mesh.texture_coords[0], Vector2::new(0.25, 0.75));
    }

    #[test]
    fn test_invalid_tokens() {
        assert_eq!(
            parse_err("v 0 zero 0\n"),
            (1, ParseErrorKind::InvalidNumber { token: "zero".into() })
        );
        assert_eq!(
            parse_err("v 0 nan 0\n").1,
            ParseErrorKind::InvalidNumber { token: "nan".into() }
        );
        assert!(matches!(
            parse_err("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1/ 2/ 3/\n").1,
            ParseErrorKind::MalformedReference { .. }
        ));
        assert!(matches!(
            parse_err("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1/1/ 2 3\n").1,
            ParseErrorKind::MalformedReference { .. }
        ));
    }

    #[test]
    fn test_comments_blank_lines_unknown_records_and_bom() {
        let input = "\u{feff}# exported\n\no cube\nmtllib a.mtl\nv 0 0 0 # origin\r\nv 1 0 0\n\n   \nv 0 1 0\ns off\nusemtl red\nf 1 2 3\n";
        let mesh = parse_obj(input).unwrap();
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.polygons.len(), 1);
    }

    #[test]
    fn test_validation_is_aggregated() {
        match parse_obj("# nothing here\n") {
            Err(ObjError::Validation(err)) => {
                assert_eq!(
                    err.issues,
                    vec![ValidationIssue::NoVertices, ValidationIssue::NoPolygons]
                );
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_error_messages_carry_context() {
        let err = parse_obj("v 0 0 0\nf 1 2 3\n").unwrap_err();
        assert_eq!(err.line(), Some(2));
        let message = err.to_string();
        assert!(message.contains("line 2"), "{message}");
        assert!(message.contains("vertex index 2"), "{message}");
    }

    #[test]
    fn test_compact_number_format() {
        assert_eq!(format_number(1.0), "1");
        assert_eq!(format_number(-2.25), "-2.25");
        assert_eq!(format_number(0.1), "0.1");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(1e-7), "0.0000001");
    }

    #[test]
    fn test_write_uses_matching_face_forms() {
        let input = "v 0 0 0\nv 1 0 0\nv 1 1 0\nvt 0 0\nvn 0 0 1\nf 1 2 3\nf 1/1 2/1 3/1\nf 1//1 2//1 3//1\nf 3/1/1 2/1/1 1/1/1\n";
        let text = write_obj(&parse_obj(input).unwrap()).unwrap();
        assert_eq!(
            text,
            "v 0 0 0\nv 1 0 0\nv 1 1 0\nvt 0 0\nvn 0 0 1\nf 1 2 3\nf 1/1 2/1 3/1\nf 1//1 2//1 3//1\nf 3/1/1 2/1/1 1/1/1\n"
        );
    }

    #[test]
    fn test_round_trip_preserves_topology() {
        let mut mesh = Mesh::cube(1.5);
        mesh.compute_normals();
        mesh.add_vertex(Vector3::new(0.125, -3.0, 1e-3));

        let reparsed = parse_obj(&write_obj(&mesh).unwrap()).unwrap();
        assert_eq!(reparsed.vertices.len(), mesh.vertices.len());
        assert_eq!(reparsed.texture_coords.len(), mesh.texture_coords.len());
        assert_eq!(reparsed.normals.len(), mesh.normals.len());
        assert_eq!(reparsed.polygons, mesh.polygons);
        assert_eq!(reparsed.vertices, mesh.vertices);
    }

    #[test]
    fn test_write_rejects_non_finite_values() {
        let mut mesh = Mesh::cube(1.0);
        mesh.vertices[3].y = f64::NAN;
        assert_eq!(
            write_obj(&mesh),
            Err(WriteError::NonFinite { record: "vertex", index: 3 })
        );

        let mut mesh = Mesh::cube(1.0);
        mesh.add_normal(Vector3::new(0.0, f64::INFINITY, 0.0));
        assert_eq!(
            write_obj(&mesh),
            Err(WriteError::NonFinite { record: "normal", index: 0 })
        );
    }
}
