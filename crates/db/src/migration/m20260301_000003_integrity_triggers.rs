//! Integrity triggers.
//!
//! Ledger entries are immutable apart from the `is_reversed` flip, audit rows
//! are append-only, and no entry may be dated inside a locked period.
//! Exception messages carry a stable prefix that the repository layer maps
//! back to typed errors.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(LEDGER_IMMUTABILITY_SQL).await?;
        db.execute_unprepared(PERIOD_LOCK_SQL).await?;
        db.execute_unprepared(AUDIT_APPEND_ONLY_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

const LEDGER_IMMUTABILITY_SQL: &str = r"
-- ============================================================
-- FUNCTION: guard_ledger_entry_update
-- Only the is_reversed false -> true flip is allowed
-- ============================================================
CREATE OR REPLACE FUNCTION guard_ledger_entry_update()
RETURNS TRIGGER AS $$
BEGIN
    IF OLD.is_reversed = false
        AND NEW.is_reversed = true
        AND (NEW.id, NEW.tx_type, NEW.direction, NEW.amount, NEW.wallet_id,
             NEW.entry_date, NEW.reference_type, NEW.reference_id,
             NEW.reference_code, NEW.performed_by, NEW.reversal_of,
             NEW.notes, NEW.created_at)
        IS NOT DISTINCT FROM
            (OLD.id, OLD.tx_type, OLD.direction, OLD.amount, OLD.wallet_id,
             OLD.entry_date, OLD.reference_type, OLD.reference_id,
             OLD.reference_code, OLD.performed_by, OLD.reversal_of,
             OLD.notes, OLD.created_at)
    THEN
        RETURN NEW;
    END IF;

    RAISE EXCEPTION 'IMMUTABILITY_VIOLATION: ledger entry % can only be flagged as reversed',
        OLD.id;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_guard_ledger_entry_update
BEFORE UPDATE ON ledger_entries
FOR EACH ROW
EXECUTE FUNCTION guard_ledger_entry_update();

-- ============================================================
-- FUNCTION: forbid_ledger_entry_delete
-- ============================================================
CREATE OR REPLACE FUNCTION forbid_ledger_entry_delete()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'IMMUTABILITY_VIOLATION: ledger entry % cannot be deleted', OLD.id;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_forbid_ledger_entry_delete
BEFORE DELETE ON ledger_entries
FOR EACH ROW
EXECUTE FUNCTION forbid_ledger_entry_delete();
";

const PERIOD_LOCK_SQL: &str = r"
-- ============================================================
-- FUNCTION: reject_locked_period_entry
-- Backstop for the application gate. The containing period row is read
-- FOR SHARE, locked or not, so a concurrent lock waits for this
-- transaction and a posting never commits into a period locked after it
-- passed the gate.
-- ============================================================
CREATE OR REPLACE FUNCTION reject_locked_period_entry()
RETURNS TRIGGER AS $$
DECLARE
    period_name VARCHAR(100);
    period_locked BOOLEAN;
BEGIN
    SELECT ap.name, ap.is_locked INTO period_name, period_locked
    FROM accounting_periods ap
    WHERE NEW.entry_date BETWEEN ap.start_date AND ap.end_date
    LIMIT 1
    FOR SHARE;

    IF period_locked THEN
        RAISE EXCEPTION 'PERIOD_LOCKED: %', period_name;
    END IF;

    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_reject_locked_period_entry
BEFORE INSERT ON ledger_entries
FOR EACH ROW
EXECUTE FUNCTION reject_locked_period_entry();
";

const AUDIT_APPEND_ONLY_SQL: &str = r"
-- ============================================================
-- FUNCTION: forbid_audit_log_change
-- ============================================================
CREATE OR REPLACE FUNCTION forbid_audit_log_change()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'IMMUTABILITY_VIOLATION: audit log entry % cannot be modified (%)',
        OLD.id, TG_OP;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_forbid_audit_log_change
BEFORE UPDATE OR DELETE ON audit_logs
FOR EACH ROW
EXECUTE FUNCTION forbid_audit_log_change();
";

const DROP_ALL_SQL: &str = r"
DROP TRIGGER IF EXISTS trg_forbid_audit_log_change ON audit_logs;
DROP TRIGGER IF EXISTS trg_reject_locked_period_entry ON ledger_entries;
DROP TRIGGER IF EXISTS trg_forbid_ledger_entry_delete ON ledger_entries;
DROP TRIGGER IF EXISTS trg_guard_ledger_entry_update ON ledger_entries;

DROP FUNCTION IF EXISTS forbid_audit_log_change();
DROP FUNCTION IF EXISTS reject_locked_period_entry();
DROP FUNCTION IF EXISTS forbid_ledger_entry_delete();
DROP FUNCTION IF EXISTS guard_ledger_entry_update();
";
