diesel::table! {
    video_records (video_id) {
        video_id -> Varchar,
        title -> Varchar,
        category -> Nullable<Varchar>,
        sport -> Nullable<Varchar>,
        difficulty -> Nullable<Varchar>,
        description -> Nullable<Text>,
        file_name -> Varchar,
        file_size -> Int8,
        file_type -> Varchar,
        file_data -> Bytea,
        uploaded_at -> Timestamp,
        is_sample -> Bool,
        both_side -> Nullable<Bool>,
        online -> Nullable<Bool>,
        free_content -> Nullable<Bool>,
    }
}
