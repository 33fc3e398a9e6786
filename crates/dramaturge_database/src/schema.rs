//! Diesel table definitions for the analysis cache.

diesel::table! {
    analysis_cache (id) {
        id -> Int4,
        content_hash -> Text,
        script_name -> Text,
        provider -> Text,
        model -> Text,
        parsed_script -> Nullable<Text>,
        stage1_result -> Nullable<Text>,
        stage2_result -> Nullable<Text>,
        stage3_result -> Nullable<Text>,
        scene_count -> Nullable<Int4>,
        tcc_count -> Nullable<Int4>,
        processing_time -> Nullable<Float8>,
        api_calls -> Nullable<Int4>,
        created_at -> Nullable<Timestamptz>,
        expires_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    cache_stats (id) {
        id -> Int4,
        total_hits -> Int8,
        total_misses -> Int8,
    }
}

diesel::allow_tables_to_appear_in_same_query!(analysis_cache, cache_stats);
