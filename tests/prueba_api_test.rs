// ==========================================
// PruebaApi 集成测试
// ==========================================
// 测试范围:
// 1. 测评生命周期: 创建/编辑/查询/删除, 原子校验
// 2. 名单导入: 表头校验, 去重统计, 文件格式
// 3. 学生维护: 新增/创建或更新/删除, 成绩整体替换
// 4. 三级平均值: 组内学习成果/分组/测评
// ==========================================

mod helpers;

use academic_qa::api::ApiError;
use academic_qa::engine::{GradeInput, StudentPatch};
use helpers::api_test_helper::*;

const ROSTER_CSV: &[u8] = b"Documento,Nombre\n123,Ana\n456,Luis\n";

fn grade(outcome_id: &str, score: f64) -> GradeInput {
    GradeInput {
        id: None,
        outcome_id: Some(outcome_id.to_string()),
        score: Some(score),
    }
}

fn grades_patch(grades: Vec<GradeInput>) -> StudentPatch {
    StudentPatch {
        document: None,
        name: None,
        grades: Some(grades),
    }
}

// ==========================================
// 测评生命周期
// ==========================================

#[test]
fn test_create_prueba_builds_named_empty_groups() {
    let s = Scenario::new();
    let prueba = s.env.prueba_api.create_prueba(s.request()).expect("创建测评失败");

    assert_eq!(prueba.name, "Parcial 1");
    assert_eq!(prueba.date, "2024-03-15");
    assert_eq!(prueba.average, 0.0);
    assert_eq!(prueba.groups.len(), 2);
    assert_eq!(prueba.groups[0].name, "Grupo 1");
    assert_eq!(prueba.groups[1].name, "Grupo 2");
    assert_eq!(prueba.groups[1].responsible_id, s.evaluators[1].id);
    assert!(prueba.groups.iter().all(|g| g.students.is_empty() && g.average == 0.0));

    // 引用解析
    assert_eq!(prueba.program.as_ref().map(|p| p.name.as_str()), Some("Sistemas"));
    assert_eq!(prueba.learning_outcomes.len(), 2);
    assert_eq!(prueba.learning_outcomes[0].name.as_deref(), Some("RA1"));
    let responsible = prueba.groups[0].responsible.as_ref().expect("负责人未解析");
    assert_eq!(responsible.username, "eval1");

    // 每个分组按测评学习成果顺序输出平均值
    let ids: Vec<_> = prueba.groups[0]
        .outcome_averages
        .iter()
        .map(|a| a.outcome_id.clone())
        .collect();
    assert_eq!(ids, vec![s.outcome_a.id.clone(), s.outcome_b.id.clone()]);
}

#[test]
fn test_create_prueba_date_defaults_to_today() {
    let s = Scenario::new();
    let mut request = s.request();
    request.date = None;

    let prueba = s.env.prueba_api.create_prueba(request).unwrap();
    let today = chrono::Local::now().format("%Y-%m-%d").to_string();
    assert_eq!(prueba.date, today);
}

#[test]
fn test_create_prueba_负责人不足_不落库() {
    let s = Scenario::new();
    let mut request = s.request();
    request.group_count = 3;

    let err = s.env.prueba_api.create_prueba(request).unwrap_err();
    assert!(matches!(err, ApiError::ValidationError(_)), "实际错误: {:?}", err);
    assert!(s.env.prueba_api.list_pruebas().unwrap().is_empty());
}

#[test]
fn test_create_prueba_负责人不存在_不落库() {
    let s = Scenario::new();
    let mut request = s.request();
    request.responsible_user_ids[1] = "no-existe".to_string();

    let err = s.env.prueba_api.create_prueba(request).unwrap_err();
    match err {
        ApiError::NotFound(msg) => assert!(msg.contains("no-existe")),
        other => panic!("期望 NotFound, 实际: {:?}", other),
    }
    assert!(s.env.prueba_api.list_pruebas().unwrap().is_empty());
}

#[test]
fn test_create_prueba_rejects_bad_references() {
    let s = Scenario::new();

    let mut unknown_program = s.request();
    unknown_program.program_id = "P-x".to_string();
    assert!(matches!(
        s.env.prueba_api.create_prueba(unknown_program),
        Err(ApiError::NotFound(_))
    ));

    let mut unknown_outcome = s.request();
    unknown_outcome.learning_outcome_ids.push("RA-x".to_string());
    assert!(matches!(
        s.env.prueba_api.create_prueba(unknown_outcome),
        Err(ApiError::NotFound(_))
    ));

    let mut repeated = s.request();
    repeated.learning_outcome_ids = vec![s.outcome_a.id.clone(), s.outcome_a.id.clone()];
    assert!(matches!(
        s.env.prueba_api.create_prueba(repeated),
        Err(ApiError::ValidationError(_))
    ));

    let mut no_outcomes = s.request();
    no_outcomes.learning_outcome_ids.clear();
    assert!(matches!(
        s.env.prueba_api.create_prueba(no_outcomes),
        Err(ApiError::ValidationError(_))
    ));

    let mut zero_groups = s.request();
    zero_groups.group_count = 0;
    assert!(matches!(
        s.env.prueba_api.create_prueba(zero_groups),
        Err(ApiError::ValidationError(_))
    ));

    assert!(s.env.prueba_api.list_pruebas().unwrap().is_empty());
}

#[test]
fn test_edit_prueba_resets_groups_and_grades() {
    let s = Scenario::new();
    let api = &s.env.prueba_api;
    let prueba = api.create_prueba(s.request()).unwrap();
    let group_id = prueba.groups[0].id.clone();

    let student = api.create_student(&prueba.id, &group_id, "123", "Ana").unwrap();
    api.upsert_student(
        &prueba.id,
        &group_id,
        &student.id,
        grades_patch(vec![grade(&s.outcome_a.id, 4.5)]),
    )
    .unwrap();
    assert_eq!(api.get_prueba(&prueba.id).unwrap().average, 4.5);

    let mut request = s.request();
    request.name = "Parcial 1 (editado)".to_string();
    request.group_count = 1;
    request.learning_outcome_ids = vec![s.outcome_b.id.clone()];
    let edited = api.edit_prueba(&prueba.id, request).unwrap();

    assert_eq!(edited.id, prueba.id);
    assert_eq!(edited.name, "Parcial 1 (editado)");
    assert_eq!(edited.groups.len(), 1);
    assert_ne!(edited.groups[0].id, group_id);
    assert!(edited.groups[0].students.is_empty());
    assert_eq!(edited.average, 0.0);

    // 旧分组已不存在
    assert!(matches!(
        api.get_group(&prueba.id, &group_id),
        Err(ApiError::NotFound(_))
    ));
}

#[test]
fn test_edit_prueba_without_date_keeps_stored_date() {
    let s = Scenario::new();
    let api = &s.env.prueba_api;
    let prueba = api.create_prueba(s.request()).unwrap();
    assert_eq!(prueba.date, "2024-03-15");

    let mut request = s.request();
    request.date = None;
    let edited = api.edit_prueba(&prueba.id, request).unwrap();
    assert_eq!(edited.date, "2024-03-15");
    assert_eq!(api.get_prueba(&prueba.id).unwrap().date, "2024-03-15");

    // 空白日期同样视为未提供
    let mut request = s.request();
    request.date = Some("   ".to_string());
    assert_eq!(api.edit_prueba(&prueba.id, request).unwrap().date, "2024-03-15");

    let mut request = s.request();
    request.date = Some("2024-04-02".to_string());
    assert_eq!(api.edit_prueba(&prueba.id, request).unwrap().date, "2024-04-02");
}

#[test]
fn test_create_prueba_without_date_uses_today() {
    let s = Scenario::new();
    let mut request = s.request();
    request.date = None;
    let prueba = s.env.prueba_api.create_prueba(request).unwrap();
    assert_eq!(prueba.date.len(), "2024-03-15".len());
    assert!(chrono::NaiveDate::parse_from_str(&prueba.date, "%Y-%m-%d").is_ok());
}

#[test]
fn test_edit_prueba_invalid_request_keeps_record() {
    let s = Scenario::new();
    let api = &s.env.prueba_api;
    let prueba = api.create_prueba(s.request()).unwrap();

    let mut request = s.request();
    request.group_count = 5;
    assert!(api.edit_prueba(&prueba.id, request).is_err());

    let reloaded = api.get_prueba(&prueba.id).unwrap();
    assert_eq!(reloaded.groups.len(), 2);
    assert_eq!(reloaded.groups[0].id, prueba.groups[0].id);
}

#[test]
fn test_get_and_delete_missing_prueba() {
    let s = Scenario::new();
    assert!(matches!(
        s.env.prueba_api.get_prueba("no-existe"),
        Err(ApiError::NotFound(_))
    ));
    assert!(matches!(
        s.env.prueba_api.delete_prueba("no-existe"),
        Err(ApiError::NotFound(_))
    ));
    assert!(matches!(
        s.env.prueba_api.get_prueba("  "),
        Err(ApiError::InvalidInput(_))
    ));
}

#[test]
fn test_delete_prueba() {
    let s = Scenario::new();
    let prueba = s.env.prueba_api.create_prueba(s.request()).unwrap();
    s.env.prueba_api.delete_prueba(&prueba.id).unwrap();
    assert!(s.env.prueba_api.list_pruebas().unwrap().is_empty());
}

// ==========================================
// 名单导入
// ==========================================

#[test]
fn test_import_roster_appends_entries() {
    let s = Scenario::new();
    let api = &s.env.prueba_api;
    let prueba = api.create_prueba(s.request()).unwrap();
    let group_id = prueba.groups[0].id.clone();
    api.create_student(&prueba.id, &group_id, "999", "Zoe").unwrap();

    let result = api
        .import_roster(&prueba.id, &group_id, "lista.csv", ROSTER_CSV)
        .expect("导入失败");
    assert_eq!(result.imported, 2);
    assert_eq!(result.skipped, 0);

    let group = api.get_group(&prueba.id, &group_id).unwrap();
    assert_eq!(group.students.len(), 3);
    assert!(group.students.iter().all(|st| st.grades.is_empty()));

    // 其他分组不受影响
    let other = api.get_group(&prueba.id, &prueba.groups[1].id).unwrap();
    assert!(other.students.is_empty());
}

#[test]
fn test_import_roster_skips_duplicates_and_incomplete_rows() {
    let s = Scenario::new();
    let api = &s.env.prueba_api;
    let prueba = api.create_prueba(s.request()).unwrap();
    let group_id = prueba.groups[0].id.clone();
    api.import_roster(&prueba.id, &group_id, "lista.csv", ROSTER_CSV)
        .unwrap();

    let second = b"documento,NOMBRE\n123,Ana Otra\n789,Marta\n789,Marta Bis\n,Sin Documento\n";
    let result = api
        .import_roster(&prueba.id, &group_id, "lista2.csv", second)
        .unwrap();

    assert_eq!(result.imported, 1);
    assert_eq!(result.summary.skipped_duplicates, 2);
    assert_eq!(result.summary.skipped_incomplete, 1);
    assert_eq!(result.skipped, 3);

    let group = api.get_group(&prueba.id, &group_id).unwrap();
    let documents: Vec<_> = group.students.iter().map(|st| st.document.as_str()).collect();
    assert_eq!(group.students.len(), 3);
    assert!(documents.contains(&"789"));
}

#[test]
fn test_import_roster_from_xlsx_numeric_documents() {
    let s = Scenario::new();
    let api = &s.env.prueba_api;
    let prueba = api.create_prueba(s.request()).unwrap();
    let group_id = prueba.groups[0].id.clone();
    let bytes = std::fs::read("tests/fixtures/datasets/roster_numeric.xlsx").expect("读取测试文件失败");

    let result = api
        .import_roster(&prueba.id, &group_id, "lista.xlsx", &bytes)
        .expect("导入失败");
    assert_eq!(result.imported, 2);
    assert_eq!(result.summary.skipped_duplicates, 1);
    assert_eq!(result.summary.skipped_incomplete, 1);

    let group = api.get_group(&prueba.id, &group_id).unwrap();
    let mut documents: Vec<_> = group.students.iter().map(|st| st.document.as_str()).collect();
    documents.sort();
    assert_eq!(documents, vec!["123", "456"]);
    assert!(group.students.iter().any(|st| st.name == "Ana"));
}

#[test]
fn test_import_roster_表头不合法_名单不变() {
    let s = Scenario::new();
    let api = &s.env.prueba_api;
    let prueba = api.create_prueba(s.request()).unwrap();
    let group_id = prueba.groups[0].id.clone();
    api.create_student(&prueba.id, &group_id, "1", "Ana").unwrap();

    let err = api
        .import_roster(&prueba.id, &group_id, "lista.csv", b"Cedula,Alumno\n123,Luis\n")
        .unwrap_err();
    assert!(matches!(err, ApiError::ValidationError(_)), "实际错误: {:?}", err);

    let group = api.get_group(&prueba.id, &group_id).unwrap();
    assert_eq!(group.students.len(), 1);
}

#[test]
fn test_import_roster_rejects_unsupported_or_empty_file() {
    let s = Scenario::new();
    let api = &s.env.prueba_api;
    let prueba = api.create_prueba(s.request()).unwrap();
    let group_id = prueba.groups[0].id.clone();

    assert!(matches!(
        api.import_roster(&prueba.id, &group_id, "lista.txt", ROSTER_CSV),
        Err(ApiError::ImportError(_))
    ));
    assert!(matches!(
        api.import_roster(&prueba.id, &group_id, "lista.csv", b""),
        Err(ApiError::ImportError(_))
    ));
    assert!(matches!(
        api.import_roster(&prueba.id, "G-x", "lista.csv", ROSTER_CSV),
        Err(ApiError::NotFound(_))
    ));
}

// ==========================================
// 学生维护与平均值
// ==========================================

#[test]
fn test_three_tier_averages() {
    let s = Scenario::new();
    let api = &s.env.prueba_api;
    let prueba = api.create_prueba(s.request()).unwrap();
    let g1 = prueba.groups[0].id.clone();
    let g2 = prueba.groups[1].id.clone();
    let a = s.outcome_a.id.clone();
    let b = s.outcome_b.id.clone();

    let s1 = api.create_student(&prueba.id, &g1, "1", "S1").unwrap();
    let s2 = api.create_student(&prueba.id, &g1, "2", "S2").unwrap();
    let s3 = api.create_student(&prueba.id, &g2, "3", "S3").unwrap();
    api.upsert_student(&prueba.id, &g1, &s1.id, grades_patch(vec![grade(&a, 4.0), grade(&a, 5.0)]))
        .unwrap();
    api.upsert_student(&prueba.id, &g1, &s2.id, grades_patch(vec![grade(&a, 3.0), grade(&b, 2.0)]))
        .unwrap();
    api.upsert_student(&prueba.id, &g2, &s3.id, grades_patch(vec![grade(&b, 1.0)]))
        .unwrap();

    let detail = api.get_prueba(&prueba.id).unwrap();
    let group1 = &detail.groups[0];
    assert_eq!(group1.outcome_averages[0].outcome_id, a);
    assert_eq!(group1.outcome_averages[0].average, 4.0);
    assert_eq!(group1.outcome_averages[1].average, 2.0);
    assert_eq!(group1.average, 3.5);

    let group2 = &detail.groups[1];
    assert_eq!(group2.outcome_averages[0].average, 0.0);
    assert_eq!(group2.outcome_averages[1].average, 1.0);
    assert_eq!(group2.average, 1.0);

    assert_eq!(detail.average, 3.0);

    // 重复读取结果一致
    let again = api.get_prueba(&prueba.id).unwrap();
    assert_eq!(again, detail);
}

#[test]
fn test_upsert_student_grade_list_semantics() {
    let s = Scenario::new();
    let api = &s.env.prueba_api;
    let prueba = api.create_prueba(s.request()).unwrap();
    let g1 = prueba.groups[0].id.clone();
    let a = s.outcome_a.id.clone();

    let student = api.create_student(&prueba.id, &g1, "1", "Ana").unwrap();
    api.upsert_student(&prueba.id, &g1, &student.id, grades_patch(vec![grade(&a, 4.0)]))
        .unwrap();

    // 未提供成绩列表: 保留成绩, 只改姓名
    let renamed = api
        .upsert_student(
            &prueba.id,
            &g1,
            &student.id,
            StudentPatch {
                document: Some(" ".to_string()),
                name: Some("Ana María".to_string()),
                grades: None,
            },
        )
        .unwrap();
    assert!(!renamed.created);
    assert_eq!(renamed.student.name, "Ana María");
    assert_eq!(renamed.student.document, "1");
    assert_eq!(renamed.student.grades.len(), 1);
    assert_eq!(renamed.student.grades[0].outcome_name.as_deref(), Some("RA1"));

    // 空列表: 清空成绩
    let cleared = api
        .upsert_student(&prueba.id, &g1, &student.id, grades_patch(vec![]))
        .unwrap();
    assert!(cleared.student.grades.is_empty());
    assert_eq!(api.get_prueba(&prueba.id).unwrap().average, 0.0);
}

#[test]
fn test_upsert_student_rejects_out_of_set_outcome() {
    let s = Scenario::new();
    let api = &s.env.prueba_api;
    let prueba = api.create_prueba(s.request()).unwrap();
    let g1 = prueba.groups[0].id.clone();
    let foreign = s.env.seed_outcome("RA-ajeno", &s.program.id);

    let student = api.create_student(&prueba.id, &g1, "1", "Ana").unwrap();
    api.upsert_student(&prueba.id, &g1, &student.id, grades_patch(vec![grade(&s.outcome_a.id, 3.0)]))
        .unwrap();

    let err = api
        .upsert_student(&prueba.id, &g1, &student.id, grades_patch(vec![grade(&foreign.id, 5.0)]))
        .unwrap_err();
    assert!(matches!(err, ApiError::ValidationError(_)));

    let group = api.get_group(&prueba.id, &g1).unwrap();
    assert_eq!(group.students[0].grades.len(), 1);
    assert_eq!(group.students[0].grades[0].score, 3.0);
}

#[test]
fn test_upsert_student_creates_when_missing() {
    let s = Scenario::new();
    let api = &s.env.prueba_api;
    let prueba = api.create_prueba(s.request()).unwrap();
    let g1 = prueba.groups[0].id.clone();

    let missing_fields = api
        .upsert_student(&prueba.id, &g1, "nuevo", StudentPatch {
            document: Some("55".to_string()),
            name: None,
            grades: None,
        })
        .unwrap_err();
    assert!(matches!(missing_fields, ApiError::ValidationError(_)));

    let created = api
        .upsert_student(&prueba.id, &g1, "nuevo", StudentPatch {
            document: Some("55".to_string()),
            name: Some("Pedro".to_string()),
            grades: Some(vec![grade(&s.outcome_b.id, 2.5)]),
        })
        .unwrap();
    assert!(created.created);
    assert_eq!(created.student.grades.len(), 1);

    let detail = api.get_prueba(&prueba.id).unwrap();
    assert_eq!(detail.groups[0].students.len(), 1);
    assert_eq!(detail.groups[0].outcome_averages[1].average, 2.5);
}

#[test]
fn test_create_student_document_unique_in_group() {
    let s = Scenario::new();
    let api = &s.env.prueba_api;
    let prueba = api.create_prueba(s.request()).unwrap();
    let g1 = prueba.groups[0].id.clone();
    let g2 = prueba.groups[1].id.clone();

    api.create_student(&prueba.id, &g1, "123", "Ana").unwrap();
    assert!(matches!(
        api.create_student(&prueba.id, &g1, "123", "Otra Ana"),
        Err(ApiError::ValidationError(_))
    ));
    // 其他分组允许相同证件号
    api.create_student(&prueba.id, &g2, "123", "Ana").unwrap();

    assert!(matches!(
        api.create_student(&prueba.id, &g1, "", "Sin documento"),
        Err(ApiError::ValidationError(_))
    ));
}

#[test]
fn test_get_group_sorts_students_by_name() {
    let s = Scenario::new();
    let api = &s.env.prueba_api;
    let prueba = api.create_prueba(s.request()).unwrap();
    let g1 = prueba.groups[0].id.clone();

    for (doc, name) in [("1", "luis"), ("2", "Ana"), ("3", "beatriz")] {
        api.create_student(&prueba.id, &g1, doc, name).unwrap();
    }

    let group = api.get_group(&prueba.id, &g1).unwrap();
    let names: Vec<_> = group.students.iter().map(|st| st.name.as_str()).collect();
    assert_eq!(names, vec!["Ana", "beatriz", "luis"]);
    assert_eq!(
        group.responsible.as_ref().map(|r| r.full_name.as_str()),
        Some("EVAL1 Prueba")
    );
}

#[test]
fn test_delete_student_recomputes_averages() {
    let s = Scenario::new();
    let api = &s.env.prueba_api;
    let prueba = api.create_prueba(s.request()).unwrap();
    let g1 = prueba.groups[0].id.clone();
    let a = s.outcome_a.id.clone();

    let s1 = api.create_student(&prueba.id, &g1, "1", "S1").unwrap();
    let s2 = api.create_student(&prueba.id, &g1, "2", "S2").unwrap();
    api.upsert_student(&prueba.id, &g1, &s1.id, grades_patch(vec![grade(&a, 5.0)]))
        .unwrap();
    api.upsert_student(&prueba.id, &g1, &s2.id, grades_patch(vec![grade(&a, 3.0)]))
        .unwrap();

    let detail = api.delete_student(&prueba.id, &g1, &s1.id).unwrap();
    assert_eq!(detail.groups[0].students.len(), 1);
    assert_eq!(detail.groups[0].average, 3.0);
    assert_eq!(detail.average, 3.0);

    assert!(matches!(
        api.delete_student(&prueba.id, &g1, &s1.id),
        Err(ApiError::NotFound(_))
    ));
}
