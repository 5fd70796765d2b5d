/// The full set of SQL statements used against the turbos table
#[derive(Debug, Clone, Copy)]
pub struct Statements {
    /// inserts a new row, leaving existing (including soft-deleted) IDs untouched
    pub create: &'static str,
    /// gets a single live row by ID
    pub get: &'static str,
    /// renames a single live row by ID
    pub update: &'static str,
    /// soft-deletes a single live row by ID
    pub delete: &'static str,
}

/// Statements for the turbos table, parameterized for Postgres
pub const TURBOS: Statements = Statements {
    create: "
        INSERT INTO turbos (turbo_id, name)
        VALUES ($1, $2)
        ON CONFLICT (turbo_id) DO NOTHING",
    get: "
        SELECT turbo_id, name
        FROM turbos
        WHERE turbo_id = $1
          AND deleted_at IS NULL",
    update: "
        UPDATE turbos
        SET name = $1
        WHERE turbo_id = $2
          AND deleted_at IS NULL",
    delete: "
        UPDATE turbos
        SET deleted_at = NOW()
        WHERE turbo_id = $1
          AND deleted_at IS NULL",
};

#[cfg(test)]
mod test {
    use super::TURBOS;

    #[test]
    fn filters_out_soft_deleted_rows() {
        for statement in [TURBOS.get, TURBOS.update, TURBOS.delete] {
            assert!(
                statement.contains("deleted_at IS NULL"),
                "Statement would touch soft-deleted rows: {statement}"
            );
        }
    }

    #[test]
    fn never_hard_deletes() {
        let statements = [TURBOS.create, TURBOS.get, TURBOS.update, TURBOS.delete];

        assert!(statements
            .iter()
            .all(|statement| !statement.to_uppercase().contains("DELETE FROM")));
    }
}
