//! Générateurs de corpus partagés par les benches du front-end.

/// Produit `statements` lignes d'affectations mêlant nombres par radix,
/// chaînes et expressions parenthésées.
#[must_use]
pub fn synthetic_source(statements: usize) -> String {
    let mut out = String::with_capacity(statements * 32);
    for i in 0..statements {
        match i % 5 {
            0 => out.push_str(&format!("v{i} := {i} * ({i} + 4);\n")),
            1 => out.push_str(&format!("v{i} := $ff & %1010_1010;\n")),
            2 => out.push_str(&format!("v{i} := \"texte {i}\";\n")),
            3 => out.push_str(&format!("// commentaire {i}\nv{i} := {i};\n")),
            _ => out.push_str(&format!("v{i}: u8 := {i} % 200;\n")),
        }
    }
    out
}
