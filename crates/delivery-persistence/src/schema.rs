// Declaración manual de tablas; debe coincidir con `migrations/`.

diesel::table! {
    workflow_runs (run_id) {
        run_id -> Text,
        status -> Text,
        stage_cursor -> Int4,
        failure_detail -> Nullable<Jsonb>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    workflow_run_steps (id) {
        id -> Int8,
        run_id -> Text,
        position -> Int4,
        stage -> Text,
        entity_id -> Text,
    }
}

diesel::table! {
    briefs (brief_id) {
        brief_id -> Text,
        run_id -> Text,
        normalized_content -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    strategies (strategy_id) {
        strategy_id -> Text,
        brief_id -> Text,
        content -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    strategy_tactics (id) {
        id -> Int8,
        strategy_id -> Text,
        position -> Int4,
        channel -> Text,
        tactic -> Text,
    }
}

diesel::table! {
    draft_bundles (bundle_id) {
        bundle_id -> Text,
        strategy_id -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    draft_assets (id) {
        id -> Int8,
        bundle_id -> Text,
        position -> Int4,
        kind -> Text,
        title -> Text,
        body -> Text,
    }
}

diesel::table! {
    qc_results (result_id) {
        result_id -> Text,
        draft_id -> Text,
        passed -> Bool,
        score -> Float8,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    qc_issues (id) {
        id -> Int8,
        result_id -> Text,
        position -> Int4,
        issue -> Text,
    }
}

diesel::table! {
    delivery_packages (package_id) {
        package_id -> Text,
        draft_id -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    delivery_artifacts (id) {
        id -> Int8,
        package_id -> Text,
        position -> Int4,
        name -> Text,
        url -> Text,
        format -> Text,
    }
}

diesel::joinable!(workflow_run_steps -> workflow_runs (run_id));
diesel::joinable!(strategy_tactics -> strategies (strategy_id));
diesel::joinable!(draft_assets -> draft_bundles (bundle_id));
diesel::joinable!(qc_issues -> qc_results (result_id));
diesel::joinable!(delivery_artifacts -> delivery_packages (package_id));
